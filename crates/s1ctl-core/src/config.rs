// ── Runtime console configuration ──
//
// Describes *how* to reach one management console: URL, API token and
// transport tuning. Never touches disk; the CLI builds one from its
// profile and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed certs on an inspecting proxy).
    DangerAcceptInvalid,
}

/// Configuration for talking to a single management console.
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// Console root URL (e.g. `https://usea1-acme.sentinelone.net`).
    pub url: Url,
    /// API token sent as `Authorization: APIToken <token>`.
    pub token: SecretString,
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Total attempts per request, first one included.
    pub retries: u32,
    /// Fixed pause between two attempts.
    pub retry_pause: Duration,
}

impl ConsoleConfig {
    /// Config with the console's default transport tuning: 120 s timeout,
    /// three attempts, three seconds apart.
    pub fn new(url: Url, token: SecretString) -> Self {
        Self {
            url,
            token,
            tls: TlsVerification::default(),
            timeout: s1ctl_api::transport::DEFAULT_TIMEOUT,
            retries: 3,
            retry_pause: Duration::from_secs(3),
        }
    }
}

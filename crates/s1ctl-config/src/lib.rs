//! Shared configuration for s1ctl.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and translation to `s1ctl_core::ConsoleConfig`. The CLI layers its
//! `GlobalOpts` flag overrides on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use s1ctl_core::{ConsoleConfig, TlsVerification};

/// Keyring service name; entries are keyed `{profile}/api-token`.
pub const KEYRING_SERVICE: &str = "s1ctl";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no API token configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{name}' not found in config")]
    ProfileNotFound { name: String },

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named console profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Profile to use when none is given explicitly.
    pub fn default_profile_name(&self) -> &str {
        self.default_profile.as_deref().unwrap_or("default")
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default)]
    pub insecure: bool,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Attempts per request, first one included.
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Seconds between two attempts.
    #[serde(default = "default_retry_pause")]
    pub retry_pause: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            insecure: false,
            timeout: default_timeout(),
            retries: default_retries(),
            retry_pause: default_retry_pause(),
        }
    }
}

fn default_timeout() -> u64 {
    120
}
fn default_retries() -> u32 {
    3
}
fn default_retry_pause() -> u64 {
    3
}

/// A named management console profile.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Console root URL (e.g. "https://usea1-acme.sentinelone.net").
    pub console_url: String,

    /// API token (plaintext; prefer keyring or env var).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Environment variable name containing the API token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_env: Option<String>,

    /// Path to a custom CA certificate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insecure: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retries: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_pause: Option<u64>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "s1ctl", "s1ctl").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("s1ctl");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file + environment.
///
/// Environment keys nest on a double underscore so that names with a
/// single one stay intact: `S1CTL_DEFAULT_PROFILE`, `S1CTL_DEFAULTS__TIMEOUT`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("S1CTL_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution (without CLI flags) ───────────────────────

/// Resolve the API token from the credential chain (no CLI flag step).
pub fn resolve_token(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    // 1. Profile's token_env → env var lookup
    if let Some(ref env_name) = profile.token_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    // 2. System keyring
    if let Ok(entry) = keyring_entry(profile_name) {
        if let Ok(secret) = entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    // 3. Plaintext in config
    if let Some(ref token) = profile.token {
        return Ok(SecretString::from(token.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Store a token in the system keyring for `profile_name`.
pub fn store_token(profile_name: &str, token: &SecretString) -> Result<(), ConfigError> {
    keyring_entry(profile_name)?.set_password(token.expose_secret())?;
    Ok(())
}

fn keyring_entry(profile_name: &str) -> Result<keyring::Entry, keyring::Error> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/api-token"))
}

// ── ConsoleConfig ───────────────────────────────────────────────────

/// Build a `ConsoleConfig` from a profile and the global defaults, with
/// an already resolved token.
pub fn profile_to_console_config(
    profile: &Profile,
    defaults: &Defaults,
    token: SecretString,
) -> Result<ConsoleConfig, ConfigError> {
    let url: url::Url = profile
        .console_url
        .parse()
        .map_err(|_| ConfigError::Validation {
            field: "console_url".into(),
            reason: format!("invalid URL: {}", profile.console_url),
        })?;

    let tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    let mut config = ConsoleConfig::new(url, token);
    config.tls = tls;
    config.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    config.retries = profile.retries.unwrap_or(defaults.retries).max(1);
    config.retry_pause = Duration::from_secs(profile.retry_pause.unwrap_or(defaults.retry_pause));
    Ok(config)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use figment::Jail;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn defaults_apply_without_file() {
        Jail::expect_with(|jail| {
            let cfg = load_config_from(&jail.directory().join("missing.toml")).unwrap();
            assert_eq!(cfg.default_profile_name(), "default");
            assert_eq!(cfg.defaults.timeout, 120);
            assert_eq!(cfg.defaults.retries, 3);
            assert!(cfg.profiles.is_empty());
            Ok(())
        });
    }

    #[test]
    fn profiles_load_from_toml() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                default_profile = "prod"

                [profiles.prod]
                console_url = "https://usea1-acme.sentinelone.net"
                token_env = "ACME_S1_TOKEN"
                retries = 5
                "#,
            )?;
            let cfg = load_config_from(&jail.directory().join("config.toml")).unwrap();
            assert_eq!(cfg.default_profile_name(), "prod");
            let prod = &cfg.profiles["prod"];
            assert_eq!(prod.token_env.as_deref(), Some("ACME_S1_TOKEN"));
            assert_eq!(prod.retries, Some(5));
            Ok(())
        });
    }

    #[test]
    fn retired_default_keys_still_load() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                "[defaults]\noutput = \"json\"\ncolor = \"never\"\nretries = 4\n",
            )?;
            let cfg = load_config_from(&jail.directory().join("config.toml")).unwrap();
            assert_eq!(cfg.defaults.retries, 4);

            let saved = toml::to_string(&cfg).unwrap();
            assert!(!saved.contains("output"));
            assert!(!saved.contains("color"));
            Ok(())
        });
    }

    #[test]
    fn env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[defaults]\ntimeout = 60\n")?;
            jail.set_env("S1CTL_DEFAULTS__TIMEOUT", "15");
            jail.set_env("S1CTL_DEFAULT_PROFILE", "lab");
            let cfg = load_config_from(&jail.directory().join("config.toml")).unwrap();
            assert_eq!(cfg.defaults.timeout, 15);
            assert_eq!(cfg.default_profile_name(), "lab");
            Ok(())
        });
    }

    #[test]
    fn token_env_wins_over_plaintext() {
        Jail::expect_with(|jail| {
            jail.set_env("S1CTL_TEST_TOKEN_ENV", "from-env");
            let profile = Profile {
                console_url: "https://console.example.net".into(),
                token: Some("from-file".into()),
                token_env: Some("S1CTL_TEST_TOKEN_ENV".into()),
                ..Profile::default()
            };
            let token = resolve_token(&profile, "jail-env").unwrap();
            assert_eq!(token.expose_secret(), "from-env");
            Ok(())
        });
    }

    #[test]
    fn missing_token_is_reported_per_profile() {
        let profile = Profile {
            console_url: "https://console.example.net".into(),
            ..Profile::default()
        };
        let err = resolve_token(&profile, "s1ctl-test-no-token").unwrap_err();
        assert_eq!(
            err.to_string(),
            "no API token configured for profile 's1ctl-test-no-token'"
        );
    }

    #[test]
    fn console_config_takes_profile_over_defaults() {
        let profile = Profile {
            console_url: "https://console.example.net".into(),
            timeout: Some(30),
            ca_cert: Some(PathBuf::from("/etc/ssl/proxy.pem")),
            ..Profile::default()
        };
        let cfg = profile_to_console_config(
            &profile,
            &Defaults::default(),
            SecretString::from("t".to_owned()),
        )
        .unwrap();
        assert_eq!(cfg.timeout, Duration::from_secs(30));
        assert_eq!(cfg.retries, 3);
        assert_eq!(cfg.retry_pause, Duration::from_secs(3));
        assert_eq!(
            cfg.tls,
            TlsVerification::CustomCa(PathBuf::from("/etc/ssl/proxy.pem"))
        );
    }

    #[test]
    fn invalid_console_url_is_rejected() {
        let profile = Profile {
            console_url: "not a url".into(),
            ..Profile::default()
        };
        let err = profile_to_console_config(
            &profile,
            &Defaults::default(),
            SecretString::from("t".to_owned()),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "console_url"));
    }

    #[test]
    fn saved_config_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "lab".into(),
            Profile {
                console_url: "https://lab.example.net".into(),
                ..Profile::default()
            },
        );
        save_config_to(&cfg, &path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("[profiles.lab]"));
        assert!(!written.contains("token"));
    }
}

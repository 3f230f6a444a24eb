use thiserror::Error;

/// Top-level error type for the `s1ctl-api` crate.
///
/// Covers every failure mode of a console request: token setup,
/// transport, HTTP status failures, and response decoding.
/// `s1ctl-core` maps these into domain errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The API token cannot be encoded as an HTTP header value.
    #[error("Invalid API token: {message}")]
    InvalidToken { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request exceeded the configured timeout. Never retried.
    #[error("{context} Error: {reason} after {timeout_secs}s.")]
    Timeout {
        context: String,
        reason: String,
        timeout_secs: u64,
    },

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Console API ─────────────────────────────────────────────────
    /// Non-success HTTP status, with the captured response body.
    #[error("{context} Status code: {status} {reason}. Error: {body}")]
    Api {
        context: String,
        status: u16,
        reason: String,
        body: String,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// Response body is not valid JSON (or not the expected shape).
    #[error("API response is no valid JSON. Error: {message}")]
    Deserialization { message: String, body: String },

    /// The console handed back the cursor it was just asked for.
    #[error("Pagination did not advance: cursor {cursor} was returned twice.")]
    StalledCursor { cursor: String },

    /// Local file IO while storing a download.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns `true` if the request should be attempted again.
    ///
    /// HTTP failures and connection errors are retried; timeouts and
    /// malformed responses are terminal on the first occurrence.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Api { .. } => true,
            Self::Transport(e) => !e.is_timeout() && (e.is_connect() || e.is_request()),
            _ => false,
        }
    }

    /// HTTP status code, if the console answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns `true` if the console rejected the token.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401 | 403))
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

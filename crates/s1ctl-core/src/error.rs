// ── Core error types ──
//
// Failures a reconciler reports to its caller. Transport details from
// s1ctl-api are folded into a handful of domain variants by the
// `From<s1ctl_api::Error>` impl; the console's own message text is kept.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to console at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    /// Carries the full "... after {n}s." text.
    #[error("{message}")]
    Timeout { message: String },

    // ── Lookup errors ────────────────────────────────────────────────
    #[error("Site {name} not found")]
    SiteNotFound { name: String },

    #[error("Group {name} not found")]
    GroupNotFound { name: String },

    #[error("Error: Filter {name} does not exist.")]
    FilterNotFound { name: String },

    #[error("Error: No agent package found in management console. Please check the given parameters.")]
    PackageNotFound,

    /// More than one remote object matched a lookup that must be unique.
    #[error("{message}")]
    Ambiguous { message: String },

    // ── Input errors ─────────────────────────────────────────────────
    /// Contradicting or malformed parameters, detected before any mutation.
    #[error("{message}")]
    Validation { message: String },

    // ── Console errors ───────────────────────────────────────────────
    /// The console answered, but not with what the operation requires.
    #[error("{message}")]
    UnexpectedState { message: String },

    #[error("{message}")]
    Api { message: String, status: Option<u16> },

    // ── Local errors ─────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl CoreError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub(crate) fn unexpected(message: impl Into<String>) -> Self {
        Self::UnexpectedState {
            message: message.into(),
        }
    }

    pub(crate) fn ambiguous(message: impl Into<String>) -> Self {
        Self::Ambiguous {
            message: message.into(),
        }
    }

    /// HTTP status of the failed console call, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => *status,
            _ => None,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<s1ctl_api::Error> for CoreError {
    fn from(err: s1ctl_api::Error) -> Self {
        let message = err.to_string();
        if err.is_unauthorized() {
            return CoreError::AuthenticationFailed { message };
        }

        match err {
            s1ctl_api::Error::InvalidToken { message } => {
                CoreError::AuthenticationFailed { message }
            }
            s1ctl_api::Error::Api { status, .. } => CoreError::Api {
                message,
                status: Some(status),
            },
            s1ctl_api::Error::Transport(ref e) if e.is_connect() => CoreError::ConnectionFailed {
                url: e
                    .url()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| "<unknown>".into()),
                reason: e.to_string(),
            },
            s1ctl_api::Error::Transport(ref e) => CoreError::Api {
                message,
                status: e.status().map(|s| s.as_u16()),
            },
            s1ctl_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            s1ctl_api::Error::Timeout { .. } => CoreError::Timeout { message },
            s1ctl_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            s1ctl_api::Error::Deserialization { .. } | s1ctl_api::Error::StalledCursor { .. } => {
                CoreError::UnexpectedState { message }
            }
            s1ctl_api::Error::Io(source) => CoreError::Io {
                path: String::new(),
                source,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_failure_keeps_console_message() {
        let err = CoreError::from(s1ctl_api::Error::Api {
            context: "Failed to get site.".into(),
            status: 500,
            reason: "Internal Server Error".into(),
            body: "{}".into(),
        });
        assert_eq!(err.status(), Some(500));
        assert_eq!(
            err.to_string(),
            "Failed to get site. Status code: 500 Internal Server Error. Error: {}"
        );
    }

    #[test]
    fn rejected_token_is_authentication_failure() {
        let err = CoreError::from(s1ctl_api::Error::Api {
            context: "Failed to get account.".into(),
            status: 401,
            reason: "Unauthorized".into(),
            body: String::new(),
        });
        assert!(matches!(err, CoreError::AuthenticationFailed { .. }));
    }
}

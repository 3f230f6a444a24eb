//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors
//! with actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use s1ctl_config::ConfigError;
use s1ctl_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to management console at {url}")]
    #[diagnostic(
        code(s1ctl::connection_failed),
        help(
            "Check the console URL and your network path to it.\n\
             Reason: {reason}\n\
             Behind an inspecting proxy, configure ca_cert or use --insecure (-k)."
        )
    )]
    ConnectionFailed { url: String, reason: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(s1ctl::auth_failed),
        help(
            "Verify the API token of profile '{profile}' and that it has not expired.\n\
             Run: s1ctl config set-token --profile {profile}"
        )
    )]
    AuthFailed { profile: String, message: String },

    #[error("No API token configured for profile '{profile}'")]
    #[diagnostic(
        code(s1ctl::no_credentials),
        help(
            "Configure one with: s1ctl config init\n\
             Or set the S1CTL_TOKEN environment variable."
        )
    )]
    NoCredentials { profile: String },

    // ── Lookups ──────────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(code(s1ctl::not_found))]
    NotFound {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("{message}")]
    #[diagnostic(code(s1ctl::ambiguous))]
    Ambiguous { message: String },

    // ── Console ──────────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(code(s1ctl::api_error))]
    ApiError {
        message: String,
        status: Option<u16>,
    },

    #[error("{message}")]
    #[diagnostic(
        code(s1ctl::unexpected_state),
        help("The console answered, but not as expected. Re-run with -vv to see the requests.")
    )]
    UnexpectedState { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(s1ctl::validation))]
    Validation { field: String, reason: String },

    /// Parameter checks of a reconciler; the message names the parameter.
    #[error("{message}")]
    #[diagnostic(code(s1ctl::invalid_parameters))]
    InvalidParameters { message: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(s1ctl::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: s1ctl config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No management console configured")]
    #[diagnostic(
        code(s1ctl::no_config),
        help(
            "Create a profile with: s1ctl config init\n\
             Expected at: {path}\n\
             Or pass --console and --token."
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(s1ctl::config))]
    Config(Box<figment::Error>),

    #[error("Keyring error: {0}")]
    #[diagnostic(
        code(s1ctl::keyring),
        help("Store the token in the profile (token_env or token) instead.")
    )]
    Keyring(String),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(s1ctl::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(
        code(s1ctl::timeout),
        help("Increase the timeout with --timeout or check console responsiveness.")
    )]
    Timeout { message: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error("Failed to write {path}")]
    #[diagnostic(code(s1ctl::io))]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } | Self::Keyring(_) => {
                exit_code::AUTH
            }
            Self::NotFound { .. } | Self::ProfileNotFound { .. } | Self::NoConfig { .. } => {
                exit_code::NOT_FOUND
            }
            Self::Ambiguous { .. } => exit_code::CONFLICT,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. }
            | Self::InvalidParameters { .. }
            | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed { url, reason },

            CoreError::AuthenticationFailed { message } => CliError::AuthFailed {
                profile: "current".into(),
                message,
            },

            CoreError::Timeout { message } => CliError::Timeout { message },

            CoreError::SiteNotFound { .. } => CliError::NotFound {
                message: err.to_string(),
                help: Some("Run: s1ctl sites list to see available sites".into()),
            },

            CoreError::GroupNotFound { .. } => CliError::NotFound {
                message: err.to_string(),
                help: Some("Run: s1ctl groups list --site <SITE> to see available groups".into()),
            },

            CoreError::FilterNotFound { .. } | CoreError::PackageNotFound => CliError::NotFound {
                message: err.to_string(),
                help: None,
            },

            CoreError::Ambiguous { message } => CliError::Ambiguous { message },

            CoreError::Validation { message } => CliError::InvalidParameters { message },

            CoreError::UnexpectedState { message } => CliError::UnexpectedState { message },

            CoreError::Api { message, status } => CliError::ApiError { message, status },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },

            CoreError::Io { path, source } => CliError::Write { path, source },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::ProfileNotFound { name } => CliError::ProfileNotFound {
                name,
                available: String::new(),
            },
            ConfigError::Keyring(e) => CliError::Keyring(e.to_string()),
            ConfigError::Serialization(e) => CliError::Serialization(e),
            ConfigError::Figment(e) => CliError::Config(e),
            ConfigError::Io(e) => CliError::Io(e),
        }
    }
}

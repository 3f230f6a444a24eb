//! CLI configuration: thin wrapper around `s1ctl_config` shared types.
//!
//! Re-exports the shared types and adds CLI-specific resolution that
//! respects `GlobalOpts` flag overrides (--console, --token, etc.).

use std::time::Duration;

use secrecy::SecretString;

use s1ctl_core::{ConsoleConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use s1ctl_config::{Config, Defaults, Profile, config_path, load_config_or_default, save_config};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .unwrap_or_else(|| config.default_profile_name().to_owned())
}

/// Build the `ConsoleConfig` for this invocation.
///
/// Flags win over the profile, the profile over `[defaults]`. Without a
/// profile, `--console` and `--token` must both be given.
pub fn resolve_console_config(global: &GlobalOpts) -> Result<ConsoleConfig, CliError> {
    let config = s1ctl_config::load_config()?;
    let profile_name = active_profile_name(global, &config);

    let profile = match config.profiles.get(&profile_name) {
        Some(profile) => profile.clone(),
        None if global.console.is_some() => {
            if global.token.is_none() {
                return Err(CliError::NoCredentials {
                    profile: profile_name,
                });
            }
            Profile::default()
        }
        None if global.profile.is_some() => {
            let mut names: Vec<&str> = config.profiles.keys().map(String::as_str).collect();
            names.sort_unstable();
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: if names.is_empty() {
                    "(none)".into()
                } else {
                    names.join(", ")
                },
            });
        }
        None => {
            return Err(CliError::NoConfig {
                path: config_path().display().to_string(),
            });
        }
    };

    resolve_profile(&profile, &profile_name, &config.defaults, global)
}

/// Translate a `Profile` + global flags into a `ConsoleConfig`.
pub fn resolve_profile(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
    global: &GlobalOpts,
) -> Result<ConsoleConfig, CliError> {
    // 1. Console URL (flag > env > profile)
    let mut profile = profile.clone();
    if let Some(ref console) = global.console {
        profile.console_url.clone_from(console);
    }
    if profile.console_url.is_empty() {
        return Err(CliError::Validation {
            field: "console_url".into(),
            reason: format!("profile '{profile_name}' has no console URL"),
        });
    }

    // 2. Token (flag > token_env > keyring > plaintext)
    let token = match global.token {
        Some(ref token) => SecretString::from(token.clone()),
        None => s1ctl_config::resolve_token(&profile, profile_name)?,
    };

    let mut config = s1ctl_config::profile_to_console_config(&profile, defaults, token)?;

    // 3. Transport overrides
    if global.insecure {
        config.tls = TlsVerification::DangerAcceptInvalid;
    }
    if let Some(secs) = global.timeout {
        config.timeout = Duration::from_secs(secs);
    }
    if let Some(retries) = global.retries {
        config.retries = retries.max(1);
    }

    Ok(config)
}

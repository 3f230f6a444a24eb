// ── Reconcilers ──
//
// One module per console resource. Each takes a params struct, validates
// it before any mutating call, reads the current state, and issues the
// create / update / delete calls that bring the console in line.

pub mod agent_package;
pub mod config_override;
pub mod exclusion;
pub mod filter;
pub mod group;
pub mod policy;
pub mod site;
pub mod upgrade_policy;

use serde_json::Value;
use strum::{Display, EnumString};

use s1ctl_api::types::Success;

use crate::error::CoreError;

pub use agent_package::{AgentQuery, AgentVersion, Architecture, Downloaded, PacketFormat};
pub use config_override::{ConfigOverrideParams, OverrideState};
pub use exclusion::{ExclusionMode, ExclusionParams};
pub use filter::FilterParams;
pub use group::GroupParams;
pub use policy::PolicyParams;
pub use site::{LicenseType, SiteParams, SiteType};
pub use upgrade_policy::UpgradePolicyParams;

// ── Shared parameter types ───────────────────────────────────────────

/// Whether the object should exist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum State {
    #[default]
    Present,
    Absent,
}

/// Endpoint operating system, as the console spells it in lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum OsType {
    Windows,
    Linux,
}

/// A desired-state change, routed by [`crate::Console::apply`].
#[derive(Debug, Clone)]
pub enum Request {
    Site(SiteParams),
    Groups(GroupParams),
    Filter(FilterParams),
    Policy(PolicyParams),
    PathExclusion(ExclusionParams),
    ConfigOverride(ConfigOverrideParams),
    UpgradePolicy(UpgradePolicyParams),
}

// ── Response checks ──────────────────────────────────────────────────

/// Fail unless a create/update answered with a non-empty `data`.
pub(crate) fn require_data(data: &Value, operation: &str) -> Result<(), CoreError> {
    let empty = match data {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::Number(_) => false,
    };
    if empty {
        Err(CoreError::unexpected(format!(
            "Error in {operation}: object should have been changed via API but API result was empty"
        )))
    } else {
        Ok(())
    }
}

/// Fail unless a delete/revert answered with `data.success == true`.
pub(crate) fn require_success(result: Success, operation: &str) -> Result<(), CoreError> {
    if result.success {
        Ok(())
    } else {
        Err(CoreError::unexpected(format!(
            "Error in {operation}: API result was not 'success'"
        )))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn empty_data_is_rejected() {
        assert!(require_data(&json!({}), "update_site").is_err());
        assert!(require_data(&json!([]), "create_exclusions").is_err());
        assert!(require_data(&Value::Null, "create_filter").is_err());
        assert!(require_data(&json!({"id": "1"}), "create_filter").is_ok());
    }

    #[test]
    fn state_parses_lowercase() {
        assert_eq!("absent".parse::<State>().ok(), Some(State::Absent));
        assert_eq!(OsType::Linux.to_string(), "linux");
    }
}

// Config overrides: agent configuration overrides for one site or group,
// keyed by OS type and agent version.
//
// Overrides are immutable on the console. Every change deletes the
// current override and creates the merged (or reduced) object anew.

use serde_json::{Map, Value};
use strum::{Display, EnumString};
use tracing::info;

use s1ctl_api::types::ConfigOverride;
use s1ctl_api::{ConfigOverrideQuery, ConsoleClient};

use super::{OsType, require_data, require_success};
use crate::error::CoreError;
use crate::outcome::{ChangeRecord, Outcome};
use crate::scope::{Resolved, Target};
use crate::tree::{self, ExcludePaths, merge_compare, subtract};

/// Agent version selector meaning "all versions".
pub const ALL_VERSIONS: &str = "ALL";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum OverrideState {
    /// Merge `config` into the override, creating it if missing.
    #[default]
    Present,
    /// Remove the settings in `config` from the override.
    Absent,
    /// Delete the whole override.
    Prune,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConfigOverrideParams {
    pub site_name: String,
    /// Single group; the site itself when `None`.
    pub group: Option<String>,
    pub state: OverrideState,
    pub name: Option<String>,
    pub os_type: OsType,
    /// Specific agent version; all versions when `None`, blank or `ALL`.
    pub agent_version: Option<String>,
    pub config: Option<Value>,
    pub description: String,
}

impl ConfigOverrideParams {
    pub fn validate(&self) -> Result<(), CoreError> {
        match self.state {
            OverrideState::Present if self.name.is_none() || self.config.is_none() => Err(
                CoreError::validation("Error: 'name' and 'config' are required when state is present"),
            ),
            OverrideState::Absent if self.config.is_none() => Err(CoreError::validation(
                "Error: 'config' is required when state is absent",
            )),
            _ => Ok(()),
        }
    }

    /// Blank and `ALL` both select every agent version.
    fn specific_version(&self) -> Option<&str> {
        self.agent_version
            .as_deref()
            .map(str::trim)
            .filter(|version| !version.is_empty() && *version != ALL_VERSIONS)
    }

    /// Override object as the console should hold it.
    fn desired_object(&self, target: &Target) -> Value {
        let mut object = Map::new();
        object.insert(
            "config".into(),
            self.config.clone().unwrap_or_else(|| Value::Object(Map::new())),
        );
        object.insert("description".into(), Value::from(self.description.as_str()));
        object.insert("osType".into(), Value::from(self.os_type.to_string()));
        object.insert(
            "name".into(),
            self.name.as_deref().map_or(Value::Null, Value::from),
        );

        match self.specific_version() {
            None => {
                object.insert("versionOption".into(), Value::from("ALL"));
            }
            Some(version) => {
                object.insert("versionOption".into(), Value::from("SPECIFIC"));
                object.insert("agentVersion".into(), Value::from(version));
            }
        }

        let kind = if target.is_group() { "group" } else { "site" };
        let mut id = Map::new();
        id.insert("id".into(), Value::from(target.scope.id()));
        object.insert(kind.into(), Value::Object(id));
        object.insert("scope".into(), Value::from(kind));

        Value::Object(object)
    }
}

pub(crate) async fn apply(
    client: &ConsoleClient,
    params: &ConfigOverrideParams,
) -> Result<Outcome, CoreError> {
    params.validate()?;
    let groups: Vec<String> = params.group.iter().cloned().collect();
    let resolved = Resolved::load(client, &params.site_name, &groups).await?;
    let target = resolved
        .targets()
        .into_iter()
        .next()
        .ok_or_else(|| CoreError::unexpected("No scope resolved for config override"))?;

    let current = find_current(client, params, &target).await?;
    let mut outcome = Outcome::default();

    match params.state {
        OverrideState::Present => {
            let name = params.name.as_deref().unwrap_or_default();
            let desired = params.desired_object(&target);
            let base = current
                .as_ref()
                .map_or_else(|| Value::Object(Map::new()), ConfigOverride::to_json);
            let (diff, merged) = merge_compare(&base, &desired, &ExcludePaths::none());

            if current.is_none() {
                outcome.message(format!(
                    "Non existing config override {name} for {} created",
                    target.label()
                ));
                outcome.record(target.tag(ChangeRecord::note(format!(
                    "Non existing config override {name} created"
                ))));
            } else if !diff.is_empty() {
                outcome.message(format!(
                    "Config override {name} for {} updated",
                    target.label()
                ));
                outcome.record(target.tag(ChangeRecord::diff(diff)));
            }

            if outcome.changed {
                recreate(client, current.as_ref(), merged).await?;
            }
        }
        OverrideState::Absent => {
            let Some(existing) = current else {
                return Ok(outcome);
            };
            let remove = params.config.clone().unwrap_or(Value::Null);
            let current_config = existing
                .attributes
                .get("config")
                .cloned()
                .unwrap_or(Value::Null);
            let reduced = subtract(&current_config, &remove);

            if is_empty_config(&reduced) {
                prune(client, &existing, &target, &mut outcome).await?;
            } else {
                let diff = tree::diff(&current_config, &reduced, &ExcludePaths::none());
                if !diff.is_empty() {
                    let mut object = existing.to_json();
                    if let Value::Object(ref mut map) = object {
                        map.insert("config".into(), reduced);
                    }
                    recreate(client, Some(&existing), object).await?;
                    outcome.message(format!(
                        "Config override settings from existing config override for {} removed",
                        target.label()
                    ));
                    outcome.record(target.tag(ChangeRecord::diff(diff)));
                }
            }
        }
        OverrideState::Prune => {
            if let Some(existing) = current {
                prune(client, &existing, &target, &mut outcome).await?;
            }
        }
    }

    Ok(outcome)
}

async fn find_current(
    client: &ConsoleClient,
    params: &ConfigOverrideParams,
    target: &Target,
) -> Result<Option<ConfigOverride>, CoreError> {
    let os_type = params.os_type.to_string();
    let query = ConfigOverrideQuery {
        os_type: &os_type,
        scope: &target.scope,
        agent_version: params.specific_version(),
    };
    let mut found = client.find_config_overrides(&query).await?.data;
    if found.len() > 1 {
        return Err(CoreError::ambiguous(format!(
            "Found {} config overrides for {} matching os type {os_type} and agent version {}. \
             Expected zero or one.",
            found.len(),
            target.label(),
            params.specific_version().unwrap_or(ALL_VERSIONS)
        )));
    }
    Ok(found.pop())
}

fn is_empty_config(config: &Value) -> bool {
    match config {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Delete the current override (if any) and create `object` without its id.
async fn recreate(
    client: &ConsoleClient,
    current: Option<&ConfigOverride>,
    mut object: Value,
) -> Result<(), CoreError> {
    if let Some(existing) = current {
        delete(client, existing).await?;
    }
    if let Value::Object(ref mut map) = object {
        map.remove("id");
    }
    info!("creating config override");
    let response = client.create_config_override(object).await?;
    require_data(&response.data, "create_config_override")
}

async fn delete(client: &ConsoleClient, existing: &ConfigOverride) -> Result<(), CoreError> {
    info!(id = %existing.id, name = existing.name(), "deleting config override");
    let response = client.delete_config_override(&existing.id).await?;
    require_success(response.data, "delete_config_override")
}

async fn prune(
    client: &ConsoleClient,
    existing: &ConfigOverride,
    target: &Target,
    outcome: &mut Outcome,
) -> Result<(), CoreError> {
    delete(client, existing).await?;
    let name = existing.name();
    outcome.message(format!(
        "Config override {name} for {} pruned",
        target.label()
    ));
    outcome.record(target.tag(ChangeRecord::note(format!(
        "Config override: {name} pruned"
    ))));
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use s1ctl_api::types::ScopeRef;
    use serde_json::json;

    use super::*;

    fn params() -> ConfigOverrideParams {
        ConfigOverrideParams {
            site_name: "Lab".into(),
            group: None,
            state: OverrideState::Present,
            name: Some("tuning".into()),
            os_type: OsType::Linux,
            agent_version: None,
            config: Some(json!({"logging": {"level": "debug"}})),
            description: String::new(),
        }
    }

    #[test]
    fn required_parameters_depend_on_state() {
        let mut p = params();
        p.name = None;
        assert!(p.validate().is_err());

        p.state = OverrideState::Absent;
        assert!(p.validate().is_ok());
        p.config = None;
        assert!(p.validate().is_err());

        p.state = OverrideState::Prune;
        assert!(p.validate().is_ok());
    }

    #[test]
    fn desired_object_for_group_and_specific_version() {
        let mut p = params();
        p.agent_version = Some("23.4.2.14".into());
        let target = Target {
            scope: ScopeRef::Group("9".into()),
            name: "Servers".into(),
        };
        assert_eq!(
            p.desired_object(&target),
            json!({
                "config": {"logging": {"level": "debug"}},
                "description": "",
                "osType": "linux",
                "name": "tuning",
                "versionOption": "SPECIFIC",
                "agentVersion": "23.4.2.14",
                "group": {"id": "9"},
                "scope": "group"
            })
        );
    }

    #[test]
    fn all_is_not_a_specific_version() {
        let mut p = params();
        p.agent_version = Some("ALL".into());
        assert_eq!(p.specific_version(), None);
        let target = Target {
            scope: ScopeRef::Site("1".into()),
            name: "Lab".into(),
        };
        let object = p.desired_object(&target);
        assert_eq!(object["versionOption"], json!("ALL"));
        assert_eq!(object["site"], json!({"id": "1"}));
    }

    #[test]
    fn blank_version_selects_all_versions() {
        let mut p = params();
        for blank in ["", "   "] {
            p.agent_version = Some(blank.into());
            assert_eq!(p.specific_version(), None);
        }
        let target = Target {
            scope: ScopeRef::Site("1".into()),
            name: "Lab".into(),
        };
        let object = p.desired_object(&target);
        assert_eq!(object["versionOption"], json!("ALL"));
        assert!(object.get("agentVersion").is_none());

        p.agent_version = Some(" 23.4.2.14 ".into());
        assert_eq!(p.specific_version(), Some("23.4.2.14"));
    }

    #[test]
    fn empty_config_detection() {
        assert!(is_empty_config(&json!({})));
        assert!(is_empty_config(&Value::Null));
        assert!(!is_empty_config(&json!({"a": 1})));
    }
}

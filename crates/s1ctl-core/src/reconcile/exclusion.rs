// Path exclusions: one exclusion per path, in the site or in each group.
//
// The console cannot update an exclusion in place. Any difference deletes
// every existing exclusion for the path in scope and recreates them with
// one bulk call.

use serde_json::{Map, Value, json};
use strum::{Display, EnumString};
use tracing::info;

use s1ctl_api::ConsoleClient;

use super::{OsType, State, require_data};
use crate::error::CoreError;
use crate::outcome::{ChangeRecord, Outcome};
use crate::scope::{GroupRef, Resolved};
use crate::tree::{ExcludePaths, merge_compare};

/// Exclusion mode as named in the console UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum ExclusionMode {
    SuppressAlerts,
    Interoperability,
    InteroperabilityExtended,
    PerformanceFocus,
    PerformanceFocusExtended,
}

impl ExclusionMode {
    /// API name of the mode, if the OS supports it.
    pub fn api_name(self, os_type: OsType) -> Option<&'static str> {
        match (self, os_type) {
            (Self::SuppressAlerts, _) => Some("suppress"),
            (Self::Interoperability, OsType::Windows) => Some("disable_in_process_monitor"),
            (Self::InteroperabilityExtended, OsType::Windows) => {
                Some("disable_in_process_monitor_deep")
            }
            (Self::PerformanceFocus, _) => Some("disable_all_monitors"),
            (Self::PerformanceFocusExtended, _) => Some("disable_all_monitors_deep"),
            (Self::Interoperability | Self::InteroperabilityExtended, OsType::Linux) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionParams {
    pub site_name: String,
    pub groups: Vec<String>,
    pub state: State,
    pub os_type: Option<OsType>,
    pub os_path: String,
    pub include_subfolders: bool,
    /// Exclusion function "alerts mitigation" (`detect`).
    pub ef_alerts_mitigation: bool,
    /// Exclusion function "binary vault" (`upload`).
    pub ef_binary_vault: bool,
    pub mode: Option<ExclusionMode>,
    pub description: String,
}

impl ExclusionParams {
    pub fn new(site_name: impl Into<String>, os_path: impl Into<String>) -> Self {
        Self {
            site_name: site_name.into(),
            groups: Vec::new(),
            state: State::Present,
            os_type: None,
            os_path: os_path.into(),
            include_subfolders: false,
            ef_alerts_mitigation: true,
            ef_binary_vault: false,
            mode: None,
            description: String::new(),
        }
    }

    /// Check the parameters; returns the API mode name when present.
    pub fn validate(&self) -> Result<Option<&'static str>, CoreError> {
        if !self.ef_alerts_mitigation && !self.ef_binary_vault {
            return Err(CoreError::validation(
                "One of the following options needs to be true: ef_alerts_mitigation, ef_binary_vault",
            ));
        }
        if self.state == State::Absent {
            return Ok(None);
        }

        let (Some(mode), Some(os_type)) = (self.mode, self.os_type) else {
            return Err(CoreError::validation(
                "Error: 'mode' and 'os_type' are required when state is present",
            ));
        };
        mode.api_name(os_type).map(Some).ok_or_else(|| {
            CoreError::validation(format!(
                "The mode {mode} is not compatible with os {os_type}"
            ))
        })
    }

    /// `folder` / `subfolders` for a trailing separator, else `file`.
    pub fn path_exclusion_type(&self) -> &'static str {
        let folder = self.os_path.ends_with('/') || self.os_path.ends_with('\\');
        match (folder, self.include_subfolders) {
            (true, false) => "folder",
            (true, true) => "subfolders",
            (false, _) => "file",
        }
    }

    pub fn actions(&self) -> Vec<&'static str> {
        let mut actions = Vec::new();
        if self.ef_alerts_mitigation {
            actions.push("detect");
        }
        if self.ef_binary_vault {
            actions.push("upload");
        }
        actions
    }

    /// `data` part of the create body.
    fn desired_data(&self, mode_name: Option<&str>) -> Value {
        json!({
            "type": "path",
            "value": self.os_path,
            "mode": mode_name,
            "source": "user",
            "pathExclusionType": self.path_exclusion_type(),
            "description": self.description,
            "actions": self.actions(),
            "osType": self.os_type.map(|os| os.to_string()),
        })
    }
}

fn create_body(site_id: &str, groups: &[GroupRef], data: Value) -> Value {
    let mut filter = Map::new();
    filter.insert("siteIds".into(), json!([site_id]));
    if !groups.is_empty() {
        let ids: Vec<&str> = groups.iter().map(|g| g.id.as_str()).collect();
        filter.insert("groupIds".into(), json!(ids));
    }
    json!({ "filter": filter, "data": data })
}

pub(crate) async fn apply(
    client: &ConsoleClient,
    params: &ExclusionParams,
) -> Result<Outcome, CoreError> {
    let mode_name = params.validate()?;
    let resolved = Resolved::load(client, &params.site_name, &params.groups).await?;
    let site = &resolved.site;
    let group_ids: Vec<String> = resolved.groups.iter().map(|g| g.id.clone()).collect();

    let current = client
        .find_path_exclusions(&site.id, &params.os_path, &group_ids)
        .await?;
    let current_ids: Vec<String> = current.data.iter().map(|e| e.id.clone()).collect();
    let mut outcome = Outcome::default();

    if params.state == State::Absent {
        if current.total_items() != 0 {
            delete_existing(client, &current_ids).await?;
            outcome.message(format!(
                "Deleted all exclusions for {} in scope",
                params.os_path
            ));
            outcome.record(ChangeRecord::note("Deleted all exclusions in Scope"));
        }
        return Ok(outcome);
    }

    let desired = params.desired_data(mode_name);

    if resolved.groups.is_empty() {
        match current.data.first() {
            None => {
                let message = format!(
                    "Exclusion is missing in site {}. Creating exclusion.",
                    site.name
                );
                outcome.record(ChangeRecord::note(&message));
                outcome.message(message);
            }
            Some(exclusion) => {
                let (diff, _) = merge_compare(&exclusion.to_json(), &desired, &ExcludePaths::none());
                if !diff.is_empty() {
                    outcome.message(format!(
                        "Exclusion exists in site {} but is not up-to-date. Updating exclusion.",
                        site.name
                    ));
                    outcome.record(ChangeRecord::diff(diff).site_id(&site.id));
                }
            }
        }
    } else if usize::try_from(current.total_items()).is_ok_and(|n| n == resolved.groups.len()) {
        for exclusion in &current.data {
            let (diff, _) = merge_compare(&exclusion.to_json(), &desired, &ExcludePaths::none());
            if diff.is_empty() {
                continue;
            }
            let group_id = exclusion
                .scope_ids("groupIds")
                .into_iter()
                .next()
                .unwrap_or_default();
            let group_name = resolved
                .groups
                .iter()
                .find(|g| g.id == group_id)
                .map_or(group_id.as_str(), |g| g.name.as_str());
            outcome.message(format!(
                "Exclusion exists in group {group_name} but is not up-to-date. Updating exclusion."
            ));
            outcome.record(ChangeRecord::diff(diff).group_id(&group_id));
        }
    } else {
        let message = "Exclusion is missing in a group. Creating exclusion.";
        outcome.message(message);
        outcome.record(ChangeRecord::note(message));
    }

    if outcome.changed {
        delete_existing(client, &current_ids).await?;
        info!(path = %params.os_path, groups = resolved.groups.len(), "creating exclusions");
        let response = client
            .create_exclusions(create_body(&site.id, &resolved.groups, desired))
            .await?;
        require_data(&Value::Array(response.data), "create_exclusions")?;
    }

    Ok(outcome)
}

async fn delete_existing(client: &ConsoleClient, ids: &[String]) -> Result<(), CoreError> {
    if ids.is_empty() {
        return Ok(());
    }
    info!(count = ids.len(), "deleting exclusions");
    let response = client.delete_exclusions(ids, "path").await?;
    if response.data.affected == 0 {
        return Err(CoreError::unexpected(
            "Exclusions should have been deleted via API but API result was empty",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn params(mode: ExclusionMode, os: OsType) -> ExclusionParams {
        let mut params = ExclusionParams::new("Lab", "/opt/app/");
        params.mode = Some(mode);
        params.os_type = Some(os);
        params
    }

    #[test]
    fn mode_names_follow_os_support() {
        let windows = params(ExclusionMode::InteroperabilityExtended, OsType::Windows);
        assert_eq!(windows.validate().ok().flatten(), Some("disable_in_process_monitor_deep"));

        let linux = params(ExclusionMode::Interoperability, OsType::Linux);
        let err = linux.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "The mode interoperability is not compatible with os linux"
        );
    }

    #[test]
    fn absent_skips_mode_checks_but_not_exclusion_functions() {
        let mut params = ExclusionParams::new("Lab", "/tmp/x");
        params.state = State::Absent;
        assert!(params.validate().is_ok());

        params.ef_alerts_mitigation = false;
        assert!(params.validate().is_err());
    }

    #[test]
    fn present_requires_mode_and_os() {
        let params = ExclusionParams::new("Lab", "/tmp/x");
        assert!(params.validate().is_err());
    }

    #[test]
    fn path_type_from_trailing_separator() {
        let mut params = ExclusionParams::new("Lab", r"C:\Tools\");
        assert_eq!(params.path_exclusion_type(), "folder");
        params.include_subfolders = true;
        assert_eq!(params.path_exclusion_type(), "subfolders");
        params.os_path = "/usr/bin/tool".into();
        assert_eq!(params.path_exclusion_type(), "file");
    }

    #[test]
    fn actions_follow_exclusion_functions() {
        let mut params = ExclusionParams::new("Lab", "/x");
        params.ef_binary_vault = true;
        assert_eq!(params.actions(), vec!["detect", "upload"]);
    }

    #[test]
    fn create_body_scopes_to_groups() {
        let groups = vec![GroupRef {
            id: "5".into(),
            name: "Servers".into(),
        }];
        let body = create_body("1", &groups, json!({"type": "path"}));
        assert_eq!(
            body,
            json!({"filter": {"siteIds": ["1"], "groupIds": ["5"]}, "data": {"type": "path"}})
        );
    }
}

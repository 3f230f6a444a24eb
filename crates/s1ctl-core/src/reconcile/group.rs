// Groups: static or dynamic (filter-backed) groups inside a site.

use serde_json::{Map, Value};
use tracing::info;

use s1ctl_api::ConsoleClient;
use s1ctl_api::types::{Group, GroupKind};

use super::{State, require_success};
use crate::error::CoreError;
use crate::outcome::{ChangeRecord, Outcome};
use crate::scope;
use crate::tree::{ExcludePaths, merge_compare};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupParams {
    pub site_name: String,
    pub names: Vec<String>,
    pub state: State,
    /// Backing filter; set for dynamic groups only.
    pub filter_name: Option<String>,
}

impl GroupParams {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.names.is_empty() {
            return Err(CoreError::validation("Error: at least one group name is required."));
        }
        if self.state == State::Present && self.names.len() > 1 && self.filter_name.is_some() {
            return Err(CoreError::validation(
                "Error: You passed multiple groups while creating a dynamic group. \
                 Please either remove filter_name or pass only one group.",
            ));
        }
        Ok(())
    }
}

fn desired_body(site_id: &str, name: &str, filter_id: Option<&str>) -> Value {
    let mut body = Map::new();
    body.insert("inherits".into(), Value::Bool(true));
    body.insert("siteId".into(), Value::from(site_id));
    body.insert("name".into(), Value::from(name));
    if let Some(filter_id) = filter_id {
        body.insert("filterId".into(), Value::from(filter_id));
    }
    Value::Object(body)
}

/// A dynamic group stays dynamic and a static one static.
fn kind_matches(kind: GroupKind, dynamic: bool) -> bool {
    matches!(
        (kind, dynamic),
        (GroupKind::Dynamic, true) | (GroupKind::Static, false)
    )
}

pub(crate) async fn apply(client: &ConsoleClient, params: &GroupParams) -> Result<Outcome, CoreError> {
    params.validate()?;
    scope::account(client).await?;
    let site = scope::require_site(client, &params.site_name).await?;

    let mut current: Vec<Group> = Vec::new();
    for name in &params.names {
        let found = client.find_groups(&site.id, name).await?;
        if found.total_items() > 0 {
            current.extend(found.data.into_iter().next());
        }
    }

    let filter_id = match &params.filter_name {
        Some(filter_name) => {
            let filter = scope::filter_by_name(client, &site.id, filter_name)
                .await?
                .ok_or_else(|| CoreError::FilterNotFound {
                    name: filter_name.clone(),
                })?;
            Some(filter.id)
        }
        None => None,
    };

    let mut outcome = Outcome::default();
    for name in &params.names {
        let existing = current.iter().find(|group| &group.name == name);

        match (params.state, existing) {
            (State::Present, Some(group)) => {
                let desired = desired_body(&site.id, name, filter_id.as_deref());
                let exclude = ExcludePaths::new(["inherits"]);
                let (diff, _) = merge_compare(&group.to_json(), &desired, &exclude);
                if diff.is_empty() {
                    continue;
                }
                if !kind_matches(group.kind, filter_id.is_some()) {
                    outcome.message(
                        "Can not convert dynamic to static group and vice versa. Nothing changed.",
                    );
                    continue;
                }

                // Inheritance is left to the policies reconciler.
                let mut update = desired;
                if let Value::Object(ref mut map) = update {
                    map.remove("inherits");
                }
                info!(group = %name, changes = diff.len(), "updating group");
                let response = client.update_group(&group.id, update).await?;
                check_name(&response.data, name, "updated")?;
                outcome.message(format!("Group {name} updated"));
                outcome.record(ChangeRecord::diff(diff).group_name(name));
            }
            (State::Present, None) => {
                let desired = desired_body(&site.id, name, filter_id.as_deref());
                info!(group = %name, "creating group");
                let response = client.create_group(desired).await?;
                check_name(&response.data, name, "created")?;
                outcome.message(format!("Group {name} created."));
                outcome.record(ChangeRecord::note("Group created").group_name(name));
            }
            (State::Absent, Some(group)) => {
                info!(group = %name, "deleting group");
                let response = client.delete_group(&group.id).await?;
                require_success(response.data, "delete_group")?;
                outcome.message(format!("Group {name} deleted."));
                outcome.record(ChangeRecord::note("Group deleted").group_name(name));
            }
            (State::Absent, None) => {}
        }
    }

    Ok(outcome)
}

/// The console echoes the group back; a different name means the call
/// did not take effect.
fn check_name(data: &Value, name: &str, action: &str) -> Result<(), CoreError> {
    if data.get("name").and_then(Value::as_str) == Some(name) {
        Ok(())
    } else {
        Err(CoreError::unexpected(format!(
            "Group {name} should have been {action} via API but API result was empty"
        )))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn params(names: &[&str], filter: Option<&str>) -> GroupParams {
        GroupParams {
            site_name: "Lab".into(),
            names: names.iter().map(|n| (*n).to_owned()).collect(),
            state: State::Present,
            filter_name: filter.map(str::to_owned),
        }
    }

    #[test]
    fn multiple_dynamic_groups_are_rejected() {
        assert!(params(&["a", "b"], Some("f")).validate().is_err());
        assert!(params(&["a", "b"], None).validate().is_ok());

        let mut absent = params(&["a", "b"], Some("f"));
        absent.state = State::Absent;
        assert!(absent.validate().is_ok());
    }

    #[test]
    fn desired_body_includes_filter_for_dynamic_groups() {
        let body = desired_body("1", "Servers", Some("77"));
        assert_eq!(
            body,
            json!({"inherits": true, "siteId": "1", "name": "Servers", "filterId": "77"})
        );
    }

    #[test]
    fn kind_conversion_is_refused() {
        assert!(kind_matches(GroupKind::Dynamic, true));
        assert!(kind_matches(GroupKind::Static, false));
        assert!(!kind_matches(GroupKind::Static, true));
        assert!(!kind_matches(GroupKind::Pinned, false));
    }

    #[test]
    fn echoed_name_is_checked() {
        assert!(check_name(&json!({"name": "a"}), "a", "created").is_ok());
        assert!(check_name(&json!({}), "a", "created").is_err());
    }
}

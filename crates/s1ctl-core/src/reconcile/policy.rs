// Policies: per-site or per-group agent policy, or inheritance from the
// parent scope.

use serde_json::Value;
use tracing::info;

use s1ctl_api::ConsoleClient;

use super::{require_data, require_success};
use crate::error::CoreError;
use crate::outcome::{ChangeRecord, Outcome};
use crate::scope::{Resolved, Target};
use crate::tree::{ExcludePaths, merge_compare};

/// Settings the console still reports but rejects on update.
const DEPRECATED_SETTINGS: [&str; 2] = ["agentNotification", "agentUiOn"];

#[derive(Debug, Clone, PartialEq)]
pub struct PolicyParams {
    pub site_name: String,
    /// Groups to apply to; the site itself when empty.
    pub groups: Vec<String>,
    /// Re-enable inheritance from the parent scope instead of setting a policy.
    pub inherit: bool,
    pub policy: Option<Value>,
}

impl PolicyParams {
    pub fn validate(&self) -> Result<(), CoreError> {
        if !self.inherit && self.policy.is_none() {
            return Err(CoreError::validation(
                "Error: 'policy' is required unless inherit is set",
            ));
        }
        Ok(())
    }
}

/// Merged policy ready for `PUT .../policy`.
fn update_body(mut merged: Value) -> Value {
    if let Value::Object(ref mut map) = merged {
        for key in DEPRECATED_SETTINGS {
            map.remove(key);
        }
    }
    merged
}

fn inherits(policy: &Value) -> bool {
    match policy.get("inheritedFrom") {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

pub(crate) async fn apply(client: &ConsoleClient, params: &PolicyParams) -> Result<Outcome, CoreError> {
    params.validate()?;
    let resolved = Resolved::load(client, &params.site_name, &params.groups).await?;
    let mut outcome = Outcome::default();

    for target in resolved.targets() {
        let current = client.get_policy(&target.scope).await?.data;
        if params.inherit {
            enable_inheritance(client, &target, &current, &mut outcome).await?;
        } else {
            let desired = params.policy.clone().unwrap_or(Value::Null);
            let (diff, merged) = merge_compare(&current, &desired, &ExcludePaths::none());
            if diff.is_empty() {
                continue;
            }
            info!(scope = %target.label(), changes = diff.len(), "updating policy");
            let response = client.update_policy(&target.scope, update_body(merged)).await?;
            require_data(&response.data, "update_policy")?;
            outcome.message(format!("Updating policy for {}", target.label()));
            outcome.record(target.tag(ChangeRecord::diff(diff)));
        }
    }

    Ok(outcome)
}

async fn enable_inheritance(
    client: &ConsoleClient,
    target: &Target,
    current: &Value,
    outcome: &mut Outcome,
) -> Result<(), CoreError> {
    if inherits(current) {
        return Ok(());
    }

    let parent = if target.is_group() { "site" } else { "account" };
    info!(scope = %target.label(), "reverting policy to {parent} scope");
    let response = client.revert_policy(&target.scope).await?;
    require_success(response.data, "revert_policy")?;
    outcome.message(format!(
        "Enable inheritance from {parent} scope in {}",
        target.label()
    ));
    outcome.record(target.tag(ChangeRecord::note(format!(
        "Inheritance from {parent} scope enabled"
    ))));
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn update_body_drops_deprecated_settings() {
        let merged = json!({"mitigationMode": "protect", "agentUiOn": true, "agentNotification": false});
        assert_eq!(update_body(merged), json!({"mitigationMode": "protect"}));
    }

    #[test]
    fn inheritance_detection() {
        assert!(!inherits(&json!({"inheritedFrom": null})));
        assert!(!inherits(&json!({"inheritedFrom": ""})));
        assert!(!inherits(&json!({})));
        assert!(inherits(&json!({"inheritedFrom": "site"})));
    }

    #[test]
    fn policy_required_without_inherit() {
        let params = PolicyParams {
            site_name: "Lab".into(),
            groups: vec![],
            inherit: false,
            policy: None,
        };
        assert!(params.validate().is_err());
    }
}

// Sites: create, update or delete a site of the account by name.

use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use strum::{Display, EnumString};
use tracing::info;

use s1ctl_api::ConsoleClient;
use s1ctl_api::types::Account;

use super::{State, require_data, require_success};
use crate::error::CoreError;
use crate::outcome::{ChangeRecord, Outcome};
use crate::scope;
use crate::tree::{ExcludePaths, merge_compare};

/// Expiration value meaning "as long as the account allows".
pub const INHERIT_EXPIRATION: &str = "-1";

/// Attributes the console manages itself or that this tool never sets.
const IGNORED_PATHS: [&str; 5] = [
    "inherits",
    "licenses.bundles[0].displayName",
    "licenses.bundles[0].majorVersion",
    "licenses.bundles[0].minorVersion",
    "licenses.bundles[0].totalSurfaces",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
pub enum SiteType {
    Trial,
    #[default]
    Paid,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum LicenseType {
    #[default]
    Core,
    Control,
    Complete,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SiteParams {
    pub name: String,
    pub state: State,
    pub site_type: SiteType,
    pub license_type: LicenseType,
    /// Agent licenses for the site; `-1` is unlimited.
    pub total_agents: i64,
    /// `-1` or `YYYY-MM-DDTHH:MM±HH:MM` / `±HHMM`.
    pub expiration_date: String,
    pub description: String,
}

impl SiteParams {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: State::Present,
            site_type: SiteType::default(),
            license_type: LicenseType::default(),
            total_agents: -1,
            expiration_date: INHERIT_EXPIRATION.to_owned(),
            description: String::new(),
        }
    }

    /// Check the parameters against each other and the account.
    ///
    /// Returns the expiration normalised to UTC, or `None` when the site
    /// inherits it from the account.
    pub fn validate(&self, account: &Account) -> Result<Option<String>, CoreError> {
        if !(self.total_agents == -1 || self.total_agents > 0) {
            return Err(CoreError::validation(
                "Error: 'total_agents' has to be > 0 or -1.",
            ));
        }

        let expiration = match self.expiration_date.as_str() {
            INHERIT_EXPIRATION => None,
            "" => {
                return Err(CoreError::validation(
                    "Error: 'expiration_date' has to be -1 or in date format",
                ));
            }
            raw => Some(normalize_expiration(raw)?),
        };

        let available = account.bundle_names();
        let wanted = self.license_type.to_string();
        if !available.contains(&wanted.as_str()) {
            return Err(CoreError::validation(format!(
                "Error: 'license_type' '{wanted}' not available in account. Available license types are: {}",
                available.join(", ")
            )));
        }

        Ok(expiration)
    }

    /// Site object as the console should hold it.
    pub fn desired_body(&self, account: &Account, expiration: Option<&str>) -> Value {
        let mut body = json!({
            "accountId": account.id,
            "siteType": self.site_type.to_string(),
            "inherits": true,
            "name": self.name,
            "licenses": {
                "bundles": [{
                    "name": self.license_type.to_string(),
                    "surfaces": [{"name": "Total Agents", "count": self.total_agents}]
                }]
            }
        });

        if let Value::Object(ref mut map) = body {
            match expiration {
                Some(date) => {
                    map.insert("unlimitedExpiration".into(), Value::Bool(false));
                    map.insert("expiration".into(), Value::from(date));
                }
                None if account.unlimited_expiration => {
                    map.insert("unlimitedExpiration".into(), Value::Bool(true));
                }
                None => {
                    map.insert("unlimitedExpiration".into(), Value::Bool(false));
                    map.insert(
                        "expiration".into(),
                        account.expiration.clone().map_or(Value::Null, Value::from),
                    );
                }
            }
            if !self.description.is_empty() {
                map.insert("description".into(), Value::from(self.description.as_str()));
            }
        }
        body
    }
}

/// `2022-03-15T11:21+01:00` → `2022-03-15T10:21:00Z`
pub(crate) fn normalize_expiration(raw: &str) -> Result<String, CoreError> {
    let parse_error = |reason: String| {
        CoreError::validation(format!(
            "Error: 'expiration_date' could not be parsed as date. Error: {reason}"
        ))
    };

    // The offset may be written with or without a colon.
    let chars: Vec<char> = raw.chars().collect();
    if chars.len() < 5 {
        return Err(parse_error(format!("'{raw}' is too short")));
    }
    let (head, tail) = chars.split_at(chars.len() - 5);
    let head: String = head.iter().collect();
    let tail: String = tail.iter().filter(|c| **c != ':').collect();
    let candidate = format!("{head}{tail}");

    let parsed = DateTime::parse_from_str(&candidate, "%Y-%m-%dT%H:%M%z")
        .map_err(|e| parse_error(e.to_string()))?;
    Ok(parsed
        .with_timezone(&Utc)
        .format("%Y-%m-%dT%H:%M:00Z")
        .to_string())
}

pub(crate) async fn apply(client: &ConsoleClient, params: &SiteParams) -> Result<Outcome, CoreError> {
    let account = scope::account(client).await?;
    let current = scope::find_site(client, &params.name).await?;
    let mut outcome = Outcome::default();

    match params.state {
        State::Present => {
            let expiration = params.validate(&account)?;
            let desired = params.desired_body(&account, expiration.as_deref());

            if let Some(site) = current {
                let exclude = ExcludePaths::new(IGNORED_PATHS);
                let (diff, _) = merge_compare(&site.to_json(), &desired, &exclude);
                if !diff.is_empty() {
                    info!(site = %params.name, changes = diff.len(), "updating site");
                    let response = client.update_site(&site.id, desired).await?;
                    require_data(&response.data, "update_site")?;
                    outcome.message("Site exists but is not up-to-date. Updating site.");
                    outcome.record(ChangeRecord::diff(diff).site_name(&params.name));
                }
            } else {
                info!(site = %params.name, "creating site");
                let response = client.create_site(desired).await?;
                require_data(&response.data, "create_site")?;
                let message = format!("Site is missing. Adding site {}", params.name);
                outcome.record(ChangeRecord::note(&message));
                outcome.message(message);
            }
        }
        State::Absent => {
            if let Some(site) = current {
                info!(site = %params.name, "deleting site");
                let response = client.delete_site(&site.id).await?;
                require_success(response.data, "delete_site")?;
                let message = format!("Site {} exists. Deleting site", params.name);
                outcome.record(ChangeRecord::note(&message));
                outcome.message(message);
            }
        }
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use pretty_assertions::assert_eq;

    use super::*;

    fn account(unlimited: bool) -> Account {
        let expiration = if unlimited {
            Value::Null
        } else {
            json!("2030-01-01T00:00:00Z")
        };
        serde_json::from_value(json!({
            "id": "100",
            "name": "Acme",
            "unlimitedExpiration": unlimited,
            "expiration": expiration,
            "licenses": {"bundles": [{"name": "core"}, {"name": "control"}]}
        }))
        .unwrap()
    }

    #[test]
    fn expiration_with_colon_offset_is_normalised_to_utc() {
        assert_eq!(
            normalize_expiration("2022-03-15T10:20+00:00").unwrap(),
            "2022-03-15T10:20:00Z"
        );
        assert_eq!(
            normalize_expiration("2022-03-15T11:21+0100").unwrap(),
            "2022-03-15T10:21:00Z"
        );
    }

    #[test]
    fn garbage_expiration_is_rejected() {
        let err = normalize_expiration("next tuesday").unwrap_err();
        assert!(err.to_string().starts_with("Error: 'expiration_date' could not be parsed"));
    }

    #[test]
    fn empty_expiration_is_rejected() {
        let mut params = SiteParams::new("Lab");
        params.expiration_date = String::new();
        assert!(params.validate(&account(true)).is_err());
    }

    #[test]
    fn total_agents_must_be_positive_or_unlimited() {
        let mut params = SiteParams::new("Lab");
        params.total_agents = 0;
        let err = params.validate(&account(true)).unwrap_err();
        assert_eq!(err.to_string(), "Error: 'total_agents' has to be > 0 or -1.");
        params.total_agents = 25;
        assert!(params.validate(&account(true)).is_ok());
    }

    #[test]
    fn license_type_must_exist_in_account() {
        let mut params = SiteParams::new("Lab");
        params.license_type = LicenseType::Complete;
        let err = params.validate(&account(true)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Error: 'license_type' 'complete' not available in account. \
             Available license types are: core, control"
        );
    }

    #[test]
    fn desired_body_inherits_limited_account_expiration() {
        let params = SiteParams::new("Lab");
        let body = params.desired_body(&account(false), None);
        assert_eq!(body["unlimitedExpiration"], json!(false));
        assert_eq!(body["expiration"], json!("2030-01-01T00:00:00Z"));
        assert_eq!(body["licenses"]["bundles"][0]["surfaces"][0]["count"], json!(-1));
        assert!(body.get("description").is_none());
    }

    #[test]
    fn desired_body_with_explicit_date_and_description() {
        let mut params = SiteParams::new("Lab");
        params.description = "Test lab".into();
        params.site_type = SiteType::Trial;
        let body = params.desired_body(&account(true), Some("2025-01-01T00:00:00Z"));
        assert_eq!(
            body,
            json!({
                "accountId": "100",
                "siteType": "Trial",
                "inherits": true,
                "name": "Lab",
                "licenses": {"bundles": [{
                    "name": "core",
                    "surfaces": [{"name": "Total Agents", "count": -1}]
                }]},
                "unlimitedExpiration": false,
                "expiration": "2025-01-01T00:00:00Z",
                "description": "Test lab"
            })
        );
    }
}

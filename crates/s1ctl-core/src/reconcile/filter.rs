// Filters: named site-level queries that back dynamic groups.

use serde_json::Value;
use tracing::info;

use s1ctl_api::ConsoleClient;

use super::{State, require_data, require_success};
use crate::error::CoreError;
use crate::outcome::{ChangeRecord, Outcome};
use crate::scope;
use crate::tree::{ExcludePaths, merge_compare};

#[derive(Debug, Clone, PartialEq)]
pub struct FilterParams {
    pub site_name: String,
    pub name: String,
    pub state: State,
    /// Filter predicate (`filterFields`); required when present.
    pub filter_fields: Option<Value>,
}

impl FilterParams {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.state == State::Present && self.filter_fields.is_none() {
            return Err(CoreError::validation(
                "Error: 'filter_fields' is required when state is present",
            ));
        }
        Ok(())
    }
}

pub(crate) async fn apply(client: &ConsoleClient, params: &FilterParams) -> Result<Outcome, CoreError> {
    params.validate()?;
    scope::account(client).await?;
    let site = scope::require_site(client, &params.site_name).await?;
    let current = scope::filter_by_name(client, &site.id, &params.name).await?;
    let site_name = &params.site_name;
    let mut outcome = Outcome::default();

    match (params.state, current) {
        (State::Present, Some(filter)) => {
            let fields = params.filter_fields.clone().unwrap_or(Value::Null);
            let (diff, _) = merge_compare(&filter.filter_fields, &fields, &ExcludePaths::none());
            if !diff.is_empty() {
                info!(filter = %params.name, changes = diff.len(), "updating filter");
                let response = client.update_filter(&filter.id, &params.name, &fields).await?;
                require_data(&response.data, "update_filter")?;
                outcome.message(format!(
                    "Filter exists in site {site_name} but is not up-to-date. Updating Filter."
                ));
                outcome.record(ChangeRecord::diff(diff).site_name(site_name));
            }
        }
        (State::Present, None) => {
            let fields = params.filter_fields.clone().unwrap_or(Value::Null);
            info!(filter = %params.name, "creating filter");
            let response = client.create_filter(&site.id, &params.name, &fields).await?;
            require_data(&response.data, "create_filter")?;
            let message = format!("Filter is missing in site {site_name}. Adding filter");
            outcome.record(ChangeRecord::note(&message));
            outcome.message(message);
        }
        (State::Absent, Some(filter)) => {
            info!(filter = %params.name, "deleting filter");
            let response = client.delete_filter(&filter.id).await?;
            require_success(response.data, "delete_filter")?;
            let message = format!("Filter exists in site {site_name}. Deleting filter");
            outcome.record(ChangeRecord::note(&message));
            outcome.message(message);
        }
        (State::Absent, None) => {}
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn present_requires_filter_fields() {
        let mut params = FilterParams {
            site_name: "Lab".into(),
            name: "Linux".into(),
            state: State::Present,
            filter_fields: None,
        };
        assert!(params.validate().is_err());
        params.state = State::Absent;
        assert!(params.validate().is_ok());
    }
}

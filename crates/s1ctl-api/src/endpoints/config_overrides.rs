// Config override endpoints

use serde_json::{Value, json};
use tracing::debug;

use crate::client::{ApiRequest, ConsoleClient};
use crate::error::Error;
use crate::types::{ConfigOverride, Envelope, ScopeRef, Success};

/// Selector for the config overrides of one scope and OS.
#[derive(Debug, Clone)]
pub struct ConfigOverrideQuery<'a> {
    pub os_type: &'a str,
    pub scope: &'a ScopeRef,
    /// `None` selects overrides that apply to all agent versions.
    pub agent_version: Option<&'a str>,
}

impl ConsoleClient {
    /// `GET config-override?osTypes=..&{siteIds|groupIds}=..&versionOption=..[&agentVersions=..]`
    pub async fn find_config_overrides(
        &self,
        query: &ConfigOverrideQuery<'_>,
    ) -> Result<Envelope<Vec<ConfigOverride>>, Error> {
        let scope_kind = match query.scope {
            ScopeRef::Site(_) => "site",
            ScopeRef::Group(_) => "group",
        };
        let mut request = ApiRequest::get("config-override")
            .query("osTypes", query.os_type)
            .query(query.scope.ids_key(), query.scope.id())
            .context(format!(
                "Failed to get current config_override for {scope_kind} with id {}.",
                query.scope.id()
            ));
        request = match query.agent_version {
            None => request.query("versionOption", "ALL"),
            Some(version) => request
                .query("versionOption", "SPECIFIC")
                .query("agentVersions", version),
        };
        self.execute(&request).await
    }

    /// `POST config-override` with `{"data": override}`
    pub async fn create_config_override(&self, data: Value) -> Result<Envelope<Value>, Error> {
        debug!("creating config override");
        let request = ApiRequest::post("config-override", json!({ "data": data }))
            .context("Failed to create config override.");
        self.execute(&request).await
    }

    /// `DELETE config-override/{id}`
    pub async fn delete_config_override(&self, id: &str) -> Result<Envelope<Success>, Error> {
        debug!(id, "deleting config override");
        let request = ApiRequest::delete(format!("config-override/{id}"))
            .context("Failed to delete config override.");
        self.execute(&request).await
    }
}

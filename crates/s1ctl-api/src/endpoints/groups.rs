// Group endpoints

use serde_json::{Value, json};
use tracing::debug;

use super::PAGE_LIMIT;
use crate::client::{ApiRequest, ConsoleClient};
use crate::error::Error;
use crate::types::{Envelope, Group, Success};

impl ConsoleClient {
    /// Look up groups of a site by name.
    ///
    /// `GET groups?name={name}&siteIds={site_id}`
    pub async fn find_groups(
        &self,
        site_id: &str,
        name: &str,
    ) -> Result<Envelope<Vec<Group>>, Error> {
        let request = ApiRequest::get("groups")
            .query("name", name)
            .query("siteIds", site_id)
            .context(format!("Failed to get group {name}."));
        self.execute(&request).await
    }

    /// List every group of a site, following the pagination cursor.
    pub async fn list_all_groups(&self, site_id: &str) -> Result<Vec<Group>, Error> {
        self.paginate_all(move |cursor| async move {
            let mut request = ApiRequest::get("groups")
                .query("siteIds", site_id)
                .query("limit", PAGE_LIMIT.to_string())
                .context("Failed to list groups.");
            if let Some(cursor) = cursor {
                request = request.query("cursor", cursor);
            }
            self.execute(&request).await
        })
        .await
    }

    /// `POST groups` with `{"data": group}`
    pub async fn create_group(&self, group: Value) -> Result<Envelope<Value>, Error> {
        let name = group_name(&group);
        debug!(name = %name, "creating group");
        let request = ApiRequest::post("groups", json!({ "data": group }))
            .context(format!("Failed to create group {name}."));
        self.execute(&request).await
    }

    /// `PUT groups/{id}` with `{"data": group}`
    pub async fn update_group(&self, group_id: &str, group: Value) -> Result<Envelope<Value>, Error> {
        let name = group_name(&group);
        debug!(group_id, name = %name, "updating group");
        let request = ApiRequest::put(format!("groups/{group_id}"), json!({ "data": group }))
            .context(format!("Failed to update group {name}."));
        self.execute(&request).await
    }

    /// `DELETE groups/{id}`
    pub async fn delete_group(&self, group_id: &str) -> Result<Envelope<Success>, Error> {
        debug!(group_id, "deleting group");
        let request =
            ApiRequest::delete(format!("groups/{group_id}")).context("Failed to delete group.");
        self.execute(&request).await
    }
}

fn group_name(group: &Value) -> String {
    group
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned()
}

// Exclusion endpoints
//
// Deletion is a bulk call: `DELETE exclusions` carries the ids in its body.

use serde_json::{Value, json};
use tracing::debug;

use crate::client::{ApiRequest, ConsoleClient};
use crate::error::Error;
use crate::types::{Affected, Envelope, Exclusion};

impl ConsoleClient {
    /// Path exclusions with the given value in a site, optionally narrowed
    /// to groups.
    ///
    /// `GET exclusions?siteIds={site}&value={path}&type=path[&groupIds=a,b]`
    pub async fn find_path_exclusions(
        &self,
        site_id: &str,
        value: &str,
        group_ids: &[String],
    ) -> Result<Envelope<Vec<Exclusion>>, Error> {
        let mut request = ApiRequest::get("exclusions")
            .query("siteIds", site_id)
            .query("value", value)
            .query("type", "path")
            .context("Failed to get current exclusions.");
        if !group_ids.is_empty() {
            request = request.query("groupIds", group_ids.join(","));
        }
        self.execute(&request).await
    }

    /// `POST exclusions` with `{"filter": {..}, "data": {..}}`
    pub async fn create_exclusions(&self, body: Value) -> Result<Envelope<Vec<Value>>, Error> {
        debug!("creating exclusions");
        let request = ApiRequest::post("exclusions", body).context("Failed to create exclusions.");
        self.execute(&request).await
    }

    /// `DELETE exclusions` with `{"data": {"ids": [..], "type": kind}}`
    pub async fn delete_exclusions(
        &self,
        ids: &[String],
        kind: &str,
    ) -> Result<Envelope<Affected>, Error> {
        debug!(count = ids.len(), kind, "deleting exclusions");
        let body = json!({ "data": { "ids": ids, "type": kind } });
        let request = ApiRequest::delete("exclusions")
            .body(body)
            .context("Failed to delete exclusions.");
        self.execute(&request).await
    }
}

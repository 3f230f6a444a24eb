// Filter endpoints
//
// The `query` parameter of `GET filters` is a substring match; callers
// narrow the result to exact names themselves.

use serde_json::{Value, json};
use tracing::debug;

use crate::client::{ApiRequest, ConsoleClient};
use crate::error::Error;
use crate::types::{Envelope, Filter, Success};

impl ConsoleClient {
    /// `GET filters?siteIds={site_id}&query={query}`
    pub async fn search_filters(
        &self,
        site_id: &str,
        query: &str,
    ) -> Result<Envelope<Vec<Filter>>, Error> {
        let request = ApiRequest::get("filters")
            .query("siteIds", site_id)
            .query("query", query)
            .context("Failed to get filters from API.");
        self.execute(&request).await
    }

    /// Create a site-level filter.
    ///
    /// `POST filters` with `{"filter": {"siteIds": [..]}, "data": {..}}`
    pub async fn create_filter(
        &self,
        site_id: &str,
        name: &str,
        filter_fields: &Value,
    ) -> Result<Envelope<Value>, Error> {
        debug!(site_id, name, "creating filter");
        let body = json!({
            "filter": { "siteIds": [site_id] },
            "data": {
                "filterFields": filter_fields,
                "scopeLevel": "site",
                "siteId": site_id,
                "name": name,
            }
        });
        let request = ApiRequest::post("filters", body).context("Failed to create filter.");
        self.execute(&request).await
    }

    /// `PUT filters/{id}` with `{"data": {"filterFields": .., "name": ..}}`
    pub async fn update_filter(
        &self,
        filter_id: &str,
        name: &str,
        filter_fields: &Value,
    ) -> Result<Envelope<Value>, Error> {
        debug!(filter_id, name, "updating filter");
        let body = json!({
            "data": {
                "filterFields": filter_fields,
                "name": name,
            }
        });
        let request = ApiRequest::put(format!("filters/{filter_id}"), body)
            .context("Failed to update filter.");
        self.execute(&request).await
    }

    /// `DELETE filters/{id}`
    pub async fn delete_filter(&self, filter_id: &str) -> Result<Envelope<Success>, Error> {
        debug!(filter_id, "deleting filter");
        let request =
            ApiRequest::delete(format!("filters/{filter_id}")).context("Failed to delete filter.");
        self.execute(&request).await
    }
}

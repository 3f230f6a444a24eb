// Site endpoints
//
// `GET sites` wraps its matches as `data.sites` (next to `data.allSites`
// totals) rather than returning a bare list.

use serde_json::{Value, json};
use tracing::debug;

use super::PAGE_LIMIT;
use crate::client::{ApiRequest, ConsoleClient};
use crate::error::Error;
use crate::types::{Envelope, Site, SiteList, Success};

impl ConsoleClient {
    /// Look up active sites by exact name.
    ///
    /// `GET sites?name={name}&state=active`
    pub async fn find_active_sites(&self, name: &str) -> Result<Envelope<SiteList>, Error> {
        let request = ApiRequest::get("sites")
            .query("name", name)
            .query("state", "active")
            .context("Failed to get site.");
        self.execute(&request).await
    }

    /// List every site of the account, following the pagination cursor.
    pub async fn list_all_sites(&self) -> Result<Vec<Site>, Error> {
        self.paginate_all(move |cursor| async move {
            let mut request = ApiRequest::get("sites")
                .query("limit", PAGE_LIMIT.to_string())
                .context("Failed to list sites.");
            if let Some(cursor) = cursor {
                request = request.query("cursor", cursor);
            }
            let page: Envelope<SiteList> = self.execute(&request).await?;
            Ok(Envelope {
                data: page.data.sites,
                pagination: page.pagination,
            })
        })
        .await
    }

    /// `POST sites` with `{"data": site}`
    pub async fn create_site(&self, site: Value) -> Result<Envelope<Value>, Error> {
        debug!("creating site");
        let request =
            ApiRequest::post("sites", json!({ "data": site })).context("Failed to create site.");
        self.execute(&request).await
    }

    /// `PUT sites/{id}` with `{"data": site}`
    pub async fn update_site(&self, site_id: &str, site: Value) -> Result<Envelope<Value>, Error> {
        debug!(site_id, "updating site");
        let request = ApiRequest::put(format!("sites/{site_id}"), json!({ "data": site }))
            .context("Failed to update site.");
        self.execute(&request).await
    }

    /// `DELETE sites/{id}`
    pub async fn delete_site(&self, site_id: &str) -> Result<Envelope<Success>, Error> {
        debug!(site_id, "deleting site");
        let request = ApiRequest::delete(format!("sites/{site_id}")).context("Failed to delete site.");
        self.execute(&request).await
    }
}

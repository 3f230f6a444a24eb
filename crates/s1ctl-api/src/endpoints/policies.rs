// Policy endpoints (site or group scope)

use serde_json::{Value, json};
use tracing::debug;

use crate::client::{ApiRequest, ConsoleClient};
use crate::error::Error;
use crate::types::{Envelope, ScopeRef, Success};

impl ConsoleClient {
    /// `GET {sites|groups}/{id}/policy`
    pub async fn get_policy(&self, scope: &ScopeRef) -> Result<Envelope<Value>, Error> {
        let id = scope.id();
        let request = ApiRequest::get(format!("{}/{id}/policy", scope.collection())).context(
            format!("Failed to get current policy for site or group with id {id}."),
        );
        self.execute(&request).await
    }

    /// `PUT {sites|groups}/{id}/policy` with `{"data": policy}`
    pub async fn update_policy(
        &self,
        scope: &ScopeRef,
        policy: Value,
    ) -> Result<Envelope<Value>, Error> {
        let id = scope.id();
        debug!(scope = scope.collection(), id, "updating policy");
        let request = ApiRequest::put(
            format!("{}/{id}/policy", scope.collection()),
            json!({ "data": policy }),
        )
        .context(format!(
            "Failed to update policy with site or group id {id}."
        ));
        self.execute(&request).await
    }

    /// Re-enable inheritance from the parent scope.
    ///
    /// `PUT {sites|groups}/{id}/revert-policy`
    pub async fn revert_policy(&self, scope: &ScopeRef) -> Result<Envelope<Success>, Error> {
        let id = scope.id();
        debug!(scope = scope.collection(), id, "reverting policy");
        let request = ApiRequest::new(
            reqwest::Method::PUT,
            format!("{}/{id}/revert-policy", scope.collection()),
        )
        .context(format!(
            "Failed to revert policy with site or group id {id}."
        ));
        self.execute(&request).await
    }
}

// Upgrade policy endpoints (`tasks-configuration`, task type `agents_upgrade`)

use serde_json::{Value, json};
use tracing::debug;

use crate::client::{ApiRequest, ConsoleClient};
use crate::error::Error;
use crate::types::{Envelope, ScopeRef};

const TASK_TYPE: &str = "agents_upgrade";

impl ConsoleClient {
    /// `GET tasks-configuration?taskType=agents_upgrade&{siteIds|groupIds}={id}`
    pub async fn get_upgrade_policy(&self, scope: &ScopeRef) -> Result<Envelope<Value>, Error> {
        let request = ApiRequest::get("tasks-configuration")
            .query("taskType", TASK_TYPE)
            .query(scope.ids_key(), scope.id())
            .context(format!(
                "Failed to get current upgrade policy for site or group with id {}.",
                scope.id()
            ));
        self.execute(&request).await
    }

    /// `PUT tasks-configuration` with `{"data": .., "filter": {"taskType": .., ids: [id]}}`
    pub async fn update_upgrade_policy(
        &self,
        scope: &ScopeRef,
        data: Value,
    ) -> Result<Envelope<Value>, Error> {
        debug!(scope = scope.collection(), id = scope.id(), "updating upgrade policy");
        let mut filter = serde_json::Map::new();
        filter.insert("taskType".into(), Value::from(TASK_TYPE));
        filter.insert(scope.ids_key().into(), json!([scope.id()]));

        let body = json!({ "data": data, "filter": filter });
        let request = ApiRequest::put("tasks-configuration", body).context(format!(
            "Failed to update the upgrade policy with site or group id {}.",
            scope.id()
        ));
        self.execute(&request).await
    }
}

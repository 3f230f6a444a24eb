// Account endpoints

use crate::client::{ApiRequest, ConsoleClient};
use crate::error::Error;
use crate::types::{Account, Envelope};

impl ConsoleClient {
    /// List accounts in the `active` state.
    ///
    /// `GET accounts?states=active`
    pub async fn list_active_accounts(&self) -> Result<Envelope<Vec<Account>>, Error> {
        let request = ApiRequest::get("accounts")
            .query("states", "active")
            .context("Failed to get account.");
        self.execute(&request).await
    }
}

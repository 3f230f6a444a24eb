// ── Console handle ──
//
// Entry point for consumers: one authenticated client per invocation,
// handed by reference to whichever reconciler a request names.

use std::path::Path;

use tracing::debug;

use s1ctl_api::transport::{RetryPolicy, TlsMode, TransportConfig};
use s1ctl_api::types::{AgentPackage, Group, Site};
use s1ctl_api::ConsoleClient;

use crate::config::{ConsoleConfig, TlsVerification};
use crate::error::CoreError;
use crate::outcome::Outcome;
use crate::reconcile::{self, AgentQuery, Downloaded, Request};
use crate::scope;

/// A configured connection to one management console.
pub struct Console {
    client: ConsoleClient,
}

impl Console {
    /// Build the HTTP client from configuration. Nothing is sent until the
    /// first operation.
    pub fn new(config: &ConsoleConfig) -> Result<Self, CoreError> {
        let transport = build_transport(config);
        let client = ConsoleClient::from_token(config.url.as_str(), &config.token, &transport)?;
        debug!(url = %client.base_url(), "console client ready");
        Ok(Self { client })
    }

    /// Wrap an already-built client.
    pub fn from_client(client: ConsoleClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ConsoleClient {
        &self.client
    }

    // ── Reconcile ────────────────────────────────────────────────────

    /// Bring one console resource in line with the requested state.
    pub async fn apply(&self, request: &Request) -> Result<Outcome, CoreError> {
        let client = &self.client;
        match request {
            Request::Site(params) => reconcile::site::apply(client, params).await,
            Request::Groups(params) => reconcile::group::apply(client, params).await,
            Request::Filter(params) => reconcile::filter::apply(client, params).await,
            Request::Policy(params) => reconcile::policy::apply(client, params).await,
            Request::PathExclusion(params) => reconcile::exclusion::apply(client, params).await,
            Request::ConfigOverride(params) => {
                reconcile::config_override::apply(client, params).await
            }
            Request::UpgradePolicy(params) => {
                reconcile::upgrade_policy::apply(client, params).await
            }
        }
    }

    // ── Agent packages ───────────────────────────────────────────────

    /// Newest package matching the query.
    pub async fn agent_package(&self, query: &AgentQuery) -> Result<AgentPackage, CoreError> {
        reconcile::agent_package::find(&self.client, query).await
    }

    /// Newest package matching the query, stored in `dir`.
    pub async fn download_agent_package(
        &self,
        query: &AgentQuery,
        dir: &Path,
    ) -> Result<Downloaded, CoreError> {
        reconcile::agent_package::download(&self.client, query, dir).await
    }

    // ── Listing ──────────────────────────────────────────────────────

    pub async fn list_sites(&self) -> Result<Vec<Site>, CoreError> {
        Ok(self.client.list_all_sites().await?)
    }

    /// All groups of the named site.
    pub async fn list_groups(&self, site_name: &str) -> Result<Vec<Group>, CoreError> {
        let site = scope::require_site(&self.client, site_name).await?;
        Ok(self.client.list_all_groups(&site.id).await?)
    }
}

fn build_transport(config: &ConsoleConfig) -> TransportConfig {
    TransportConfig {
        tls: tls_to_transport(&config.tls),
        timeout: config.timeout,
        retry: RetryPolicy {
            attempts: config.retries,
            pause: config.retry_pause,
        },
    }
}

fn tls_to_transport(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    }
}

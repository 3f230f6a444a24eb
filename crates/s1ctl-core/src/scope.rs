// ── Scope resolution ──
//
// Every reconcile run starts by pinning down where it operates: the
// single active account, the site by name, and optionally groups inside
// that site. Settings objects then attach either to the site or to each
// named group, never both.

use s1ctl_api::ConsoleClient;
use s1ctl_api::types::{Account, Filter, ScopeRef, Site};
use tracing::debug;

use crate::error::CoreError;
use crate::outcome::ChangeRecord;

/// A group resolved by name inside a site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRef {
    pub id: String,
    pub name: String,
}

/// Site and groups a reconciler works in.
#[derive(Debug, Clone)]
pub(crate) struct Resolved {
    pub site: Site,
    pub groups: Vec<GroupRef>,
}

impl Resolved {
    /// Check the account, then resolve the named site (must exist) and
    /// each named group.
    pub async fn load(
        client: &ConsoleClient,
        site_name: &str,
        group_names: &[String],
    ) -> Result<Self, CoreError> {
        account(client).await?;
        let site = require_site(client, site_name).await?;
        let groups = groups(client, &site.id, group_names).await?;
        Ok(Self { site, groups })
    }

    /// One target per group if groups were named, else the site itself.
    pub fn targets(&self) -> Vec<Target> {
        if self.groups.is_empty() {
            vec![Target::site(&self.site)]
        } else {
            self.groups.iter().map(Target::group).collect()
        }
    }
}

/// A site or group that a settings object is attached to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Target {
    pub scope: ScopeRef,
    pub name: String,
}

impl Target {
    pub fn site(site: &Site) -> Self {
        Self {
            scope: ScopeRef::Site(site.id.clone()),
            name: site.name.clone(),
        }
    }

    pub fn group(group: &GroupRef) -> Self {
        Self {
            scope: ScopeRef::Group(group.id.clone()),
            name: group.name.clone(),
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self.scope, ScopeRef::Group(_))
    }

    /// `group Lab` / `site Berlin`
    pub fn label(&self) -> String {
        match self.scope {
            ScopeRef::Site(_) => format!("site {}", self.name),
            ScopeRef::Group(_) => format!("group {}", self.name),
        }
    }

    /// Attach this target's id to a change record.
    pub fn tag(&self, record: ChangeRecord) -> ChangeRecord {
        match &self.scope {
            ScopeRef::Site(id) => record.site_id(id),
            ScopeRef::Group(id) => record.group_id(id),
        }
    }
}

// ── Lookups ──────────────────────────────────────────────────────────

/// The single active account of the console.
pub(crate) async fn account(client: &ConsoleClient) -> Result<Account, CoreError> {
    let accounts = client.list_active_accounts().await?;
    match accounts.total_items() {
        0 => Err(CoreError::unexpected(
            "No Accounts found. This error should never appear",
        )),
        1 => accounts
            .into_single()
            .ok_or_else(|| CoreError::unexpected("Account listed but not returned")),
        _ => Err(CoreError::ambiguous(
            "Multiple Accounts found. This module only works with single-account management consoles",
        )),
    }
}

/// Active site with exactly this name, if exactly one matches.
pub(crate) async fn find_site(client: &ConsoleClient, name: &str) -> Result<Option<Site>, CoreError> {
    let found = client.find_active_sites(name).await?;
    if found.total_items() == 1 {
        let site = found.data.sites.into_iter().next();
        debug!(name, found = site.is_some(), "site lookup");
        Ok(site)
    } else {
        Ok(None)
    }
}

pub(crate) async fn require_site(client: &ConsoleClient, name: &str) -> Result<Site, CoreError> {
    find_site(client, name)
        .await?
        .ok_or_else(|| CoreError::SiteNotFound {
            name: name.to_owned(),
        })
}

/// Resolve each group name in a site. Every name must match exactly one
/// group.
pub(crate) async fn groups(
    client: &ConsoleClient,
    site_id: &str,
    names: &[String],
) -> Result<Vec<GroupRef>, CoreError> {
    let mut resolved = Vec::with_capacity(names.len());
    for name in names {
        let group = client
            .find_groups(site_id, name)
            .await?
            .into_single()
            .ok_or_else(|| CoreError::GroupNotFound { name: name.clone() })?;
        resolved.push(GroupRef {
            id: group.id,
            name: name.clone(),
        });
    }
    Ok(resolved)
}

/// Filter with exactly this name in a site.
///
/// The console's `query` matches substrings, so results are narrowed to
/// exact name matches here.
pub(crate) async fn filter_by_name(
    client: &ConsoleClient,
    site_id: &str,
    name: &str,
) -> Result<Option<Filter>, CoreError> {
    let response = client.search_filters(site_id, name).await?;
    let mut exact: Vec<Filter> = response
        .data
        .into_iter()
        .filter(|filter| filter.name == name)
        .collect();

    if exact.len() > 1 {
        return Err(CoreError::ambiguous(format!(
            "Found {} filters named {name} in site {site_id}. Expected zero or one.",
            exact.len()
        )));
    }
    Ok(exact.pop())
}

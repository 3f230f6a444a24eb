// Console endpoints, one module per resource.
//
// Each module adds inherent methods to `ConsoleClient`; request bodies
// that have a fixed API shape are assembled here, free-form settings
// objects are passed through as JSON.

mod accounts;
mod config_overrides;
mod exclusions;
mod filters;
mod groups;
mod packages;
mod policies;
mod sites;
mod upgrade_policies;

pub use config_overrides::ConfigOverrideQuery;
pub use packages::PackageQuery;

/// Page size used by the list endpoints.
pub(crate) const PAGE_LIMIT: u32 = 100;

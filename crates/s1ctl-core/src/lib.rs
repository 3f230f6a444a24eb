// s1ctl-core: Desired-state reconcilers for SentinelOne console settings.

pub mod config;
pub mod console;
pub mod error;
pub mod outcome;
pub mod reconcile;
pub mod scope;
pub mod tree;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{ConsoleConfig, TlsVerification};
pub use console::Console;
pub use error::CoreError;
pub use outcome::{ChangeRecord, Changes, Outcome};
pub use reconcile::*;
pub use scope::GroupRef;
pub use tree::{Change, Diff, ExcludePaths};

// Console objects the listing operations hand out.
pub use s1ctl_api::types::{AgentPackage, Group, GroupKind, Site};

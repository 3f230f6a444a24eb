//! Command dispatch: bridges CLI args -> core requests -> output formatting.

pub mod agent_packages;
pub mod config_cmd;
pub mod config_overrides;
pub mod exclusions;
pub mod filters;
pub mod groups;
pub mod policies;
pub mod sites;
pub mod upgrade_policies;
pub mod util;

use s1ctl_core::{Console, OsType, State};

use crate::cli::{Command, GlobalOpts, OsTypeArg, StateArg};
use crate::error::CliError;

/// Dispatch a console-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, console: &Console, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Sites(args) => sites::handle(console, args, global).await,
        Command::Groups(args) => groups::handle(console, args, global).await,
        Command::Filters(args) => filters::handle(console, args, global).await,
        Command::Policies(args) => policies::handle(console, args, global).await,
        Command::Exclusions(args) => exclusions::handle(console, args, global).await,
        Command::ConfigOverrides(args) => config_overrides::handle(console, args, global).await,
        Command::UpgradePolicies(args) => upgrade_policies::handle(console, args, global).await,
        Command::AgentPackages(args) => agent_packages::handle(console, args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}

// ── Shared arg conversions ───────────────────────────────────────────

impl From<StateArg> for State {
    fn from(arg: StateArg) -> Self {
        match arg {
            StateArg::Present => Self::Present,
            StateArg::Absent => Self::Absent,
        }
    }
}

impl From<OsTypeArg> for OsType {
    fn from(arg: OsTypeArg) -> Self {
        match arg {
            OsTypeArg::Windows => Self::Windows,
            OsTypeArg::Linux => Self::Linux,
        }
    }
}

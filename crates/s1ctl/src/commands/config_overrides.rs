//! Config override command handlers.

use s1ctl_core::{ConfigOverrideParams, Console, OverrideState, Request};

use crate::cli::{
    ConfigOverrideApplyArgs, ConfigOverridesArgs, ConfigOverridesCommand, GlobalOpts,
    OverrideStateArg,
};
use crate::error::CliError;

use super::util;

impl From<OverrideStateArg> for OverrideState {
    fn from(arg: OverrideStateArg) -> Self {
        match arg {
            OverrideStateArg::Present => Self::Present,
            OverrideStateArg::Absent => Self::Absent,
            OverrideStateArg::Prune => Self::Prune,
        }
    }
}

fn override_params(args: ConfigOverrideApplyArgs) -> Result<ConfigOverrideParams, CliError> {
    Ok(ConfigOverrideParams {
        site_name: args.site,
        group: args.group,
        state: args.state.into(),
        name: args.name,
        os_type: args.os_type.into(),
        agent_version: Some(args.agent_version),
        config: util::parse_json_opt("config", args.config.as_deref())?,
        description: args.description,
    })
}

pub async fn handle(
    console: &Console,
    args: ConfigOverridesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        ConfigOverridesCommand::Apply(args) => {
            let params = override_params(args)?;
            let outcome = console.apply(&Request::ConfigOverride(params)).await?;
            util::print_outcome(&outcome, global);
            Ok(())
        }
    }
}

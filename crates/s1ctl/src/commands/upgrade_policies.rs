//! Upgrade policy command handlers.

use s1ctl_core::{Console, Request, UpgradePolicyParams};

use crate::cli::{GlobalOpts, UpgradePoliciesArgs, UpgradePoliciesCommand, UpgradePolicyApplyArgs};
use crate::error::CliError;

use super::util;

fn upgrade_policy_params(args: UpgradePolicyApplyArgs) -> Result<UpgradePolicyParams, CliError> {
    Ok(UpgradePolicyParams {
        site_name: args.site,
        groups: args.groups,
        inherit_maintenance_windows: args.inherit_maintenance_windows,
        inherit_max_concurrent_downloads: args.inherit_max_concurrent_downloads,
        maintenance_windows: util::parse_json_opt(
            "maintenance-windows",
            args.maintenance_windows.as_deref(),
        )?,
        max_concurrent_downloads: args.max_concurrent_downloads,
        timezone: args.timezone,
    })
}

pub async fn handle(
    console: &Console,
    args: UpgradePoliciesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        UpgradePoliciesCommand::Apply(args) => {
            let params = upgrade_policy_params(args)?;
            let outcome = console.apply(&Request::UpgradePolicy(params)).await?;
            util::print_outcome(&outcome, global);
            Ok(())
        }
    }
}

//! Policy command handlers.

use s1ctl_core::{Console, PolicyParams, Request};

use crate::cli::{GlobalOpts, PoliciesArgs, PoliciesCommand, PolicyApplyArgs};
use crate::error::CliError;

use super::util;

fn policy_params(args: PolicyApplyArgs) -> Result<PolicyParams, CliError> {
    Ok(PolicyParams {
        site_name: args.site,
        groups: args.groups,
        inherit: args.inherit,
        policy: util::parse_json_opt("policy", args.policy.as_deref())?,
    })
}

pub async fn handle(
    console: &Console,
    args: PoliciesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        PoliciesCommand::Apply(args) => {
            let params = policy_params(args)?;
            let outcome = console.apply(&Request::Policy(params)).await?;
            util::print_outcome(&outcome, global);
            Ok(())
        }
    }
}

//! Path exclusion command handlers.

use s1ctl_core::{Console, ExclusionMode, ExclusionParams, Request};

use crate::cli::{ExclusionApplyArgs, ExclusionModeArg, ExclusionsArgs, ExclusionsCommand, GlobalOpts};
use crate::error::CliError;

use super::util;

impl From<ExclusionModeArg> for ExclusionMode {
    fn from(arg: ExclusionModeArg) -> Self {
        match arg {
            ExclusionModeArg::SuppressAlerts => Self::SuppressAlerts,
            ExclusionModeArg::Interoperability => Self::Interoperability,
            ExclusionModeArg::InteroperabilityExtended => Self::InteroperabilityExtended,
            ExclusionModeArg::PerformanceFocus => Self::PerformanceFocus,
            ExclusionModeArg::PerformanceFocusExtended => Self::PerformanceFocusExtended,
        }
    }
}

fn exclusion_params(args: ExclusionApplyArgs) -> ExclusionParams {
    ExclusionParams {
        groups: args.groups,
        state: args.state.into(),
        os_type: args.os_type.map(Into::into),
        include_subfolders: args.include_subfolders,
        ef_alerts_mitigation: args.alerts_mitigation,
        ef_binary_vault: args.binary_vault,
        mode: args.mode.map(Into::into),
        description: args.description,
        ..ExclusionParams::new(args.site, args.path)
    }
}

pub async fn handle(
    console: &Console,
    args: ExclusionsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        ExclusionsCommand::Apply(args) => {
            let params = exclusion_params(args);
            let outcome = console.apply(&Request::PathExclusion(params)).await?;
            util::print_outcome(&outcome, global);
            Ok(())
        }
    }
}

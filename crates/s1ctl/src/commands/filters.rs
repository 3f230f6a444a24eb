//! Filter command handlers.

use s1ctl_core::{Console, FilterParams, Request};

use crate::cli::{FilterApplyArgs, FiltersArgs, FiltersCommand, GlobalOpts};
use crate::error::CliError;

use super::util;

fn filter_params(args: FilterApplyArgs) -> Result<FilterParams, CliError> {
    Ok(FilterParams {
        site_name: args.site,
        name: args.name,
        state: args.state.into(),
        filter_fields: util::parse_json_opt("fields", args.fields.as_deref())?,
    })
}

pub async fn handle(
    console: &Console,
    args: FiltersArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        FiltersCommand::Apply(args) => {
            let params = filter_params(args)?;
            let outcome = console.apply(&Request::Filter(params)).await?;
            util::print_outcome(&outcome, global);
            Ok(())
        }
    }
}

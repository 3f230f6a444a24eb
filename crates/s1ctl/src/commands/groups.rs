//! Group command handlers.

use tabled::Tabled;

use s1ctl_core::{Console, Group, GroupParams, Request, State};

use crate::cli::{GlobalOpts, GroupApplyArgs, GroupsArgs, GroupsCommand};
use crate::error::CliError;
use crate::output;

use super::sites::attr;
use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct GroupRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Inherits")]
    inherits: String,
    #[tabled(rename = "Agents")]
    agents: String,
    #[tabled(rename = "Filter")]
    filter: String,
}

impl From<&Group> for GroupRow {
    fn from(g: &Group) -> Self {
        Self {
            id: g.id.clone(),
            name: g.name.clone(),
            kind: g.kind.to_string(),
            inherits: attr(&g.attributes, "inherits"),
            agents: attr(&g.attributes, "totalAgents"),
            filter: attr(&g.attributes, "filterName"),
        }
    }
}

fn group_params(args: GroupApplyArgs) -> GroupParams {
    GroupParams {
        site_name: args.site,
        names: args.names,
        state: args.state.into(),
        filter_name: args.filter,
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    console: &Console,
    args: GroupsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        GroupsCommand::List { site } => {
            let groups = console.list_groups(&site).await?;
            let out = output::render_list(
                &global.output,
                &groups,
                |g| GroupRow::from(g),
                |g| g.name.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        GroupsCommand::Apply(args) => {
            let params = group_params(args);
            if params.state == State::Absent
                && !util::confirm(
                    &format!(
                        "Delete group(s) {} of site '{}'? This is destructive.",
                        params.names.join(", "),
                        params.site_name
                    ),
                    global.yes,
                )?
            {
                return Ok(());
            }

            let outcome = console.apply(&Request::Groups(params)).await?;
            util::print_outcome(&outcome, global);
            Ok(())
        }
    }
}

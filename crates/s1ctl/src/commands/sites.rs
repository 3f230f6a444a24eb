//! Site command handlers.

use serde_json::{Map, Value};
use tabled::Tabled;

use s1ctl_core::{Console, LicenseType, Request, Site, SiteParams, SiteType, State};

use crate::cli::{GlobalOpts, LicenseTypeArg, SiteApplyArgs, SiteTypeArg, SitesArgs, SitesCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct SiteRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Type")]
    site_type: String,
    #[tabled(rename = "Agents")]
    agents: String,
    #[tabled(rename = "Expiration")]
    expiration: String,
}

impl From<&Site> for SiteRow {
    fn from(s: &Site) -> Self {
        Self {
            id: s.id.clone(),
            name: s.name.clone(),
            state: attr(&s.attributes, "state"),
            site_type: attr(&s.attributes, "siteType"),
            agents: attr(&s.attributes, "activeLicenses"),
            expiration: attr(&s.attributes, "expiration"),
        }
    }
}

/// Scalar attribute as display text; empty for missing or null.
pub(super) fn attr(attributes: &Map<String, Value>, key: &str) -> String {
    match attributes.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

// ── Arg conversions ─────────────────────────────────────────────────

impl From<SiteTypeArg> for SiteType {
    fn from(arg: SiteTypeArg) -> Self {
        match arg {
            SiteTypeArg::Trial => Self::Trial,
            SiteTypeArg::Paid => Self::Paid,
        }
    }
}

impl From<LicenseTypeArg> for LicenseType {
    fn from(arg: LicenseTypeArg) -> Self {
        match arg {
            LicenseTypeArg::Core => Self::Core,
            LicenseTypeArg::Control => Self::Control,
            LicenseTypeArg::Complete => Self::Complete,
        }
    }
}

fn site_params(args: SiteApplyArgs) -> SiteParams {
    SiteParams {
        name: args.name,
        state: args.state.into(),
        site_type: args.site_type.into(),
        license_type: args.license_type.into(),
        total_agents: args.total_agents,
        expiration_date: args.expiration,
        description: args.description,
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(console: &Console, args: SitesArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        SitesCommand::List => {
            let sites = console.list_sites().await?;
            let out = output::render_list(
                &global.output,
                &sites,
                |s| SiteRow::from(s),
                |s| s.name.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        SitesCommand::Apply(args) => {
            let params = site_params(args);
            if params.state == State::Absent
                && !util::confirm(
                    &format!(
                        "Delete site '{}' and everything in it? This is destructive.",
                        params.name
                    ),
                    global.yes,
                )?
            {
                return Ok(());
            }

            let outcome = console.apply(&Request::Site(params)).await?;
            util::print_outcome(&outcome, global);
            Ok(())
        }
    }
}

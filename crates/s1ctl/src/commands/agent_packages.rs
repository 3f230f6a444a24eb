//! Agent package command handlers.

use std::fmt::Write as _;

use s1ctl_core::{
    AgentPackage, AgentQuery, AgentVersion, Architecture, Console, Downloaded, PacketFormat,
};

use crate::cli::{
    AgentPackageQueryArgs, AgentPackagesArgs, AgentPackagesCommand, AgentVersionArg,
    ArchitectureArg, GlobalOpts, PacketFormatArg,
};
use crate::error::CliError;
use crate::output;

// ── Arg conversions ─────────────────────────────────────────────────

impl From<AgentVersionArg> for AgentVersion {
    fn from(arg: AgentVersionArg) -> Self {
        match arg {
            AgentVersionArg::Latest => Self::Latest,
            AgentVersionArg::LatestEa => Self::LatestEa,
            AgentVersionArg::Custom => Self::Custom,
        }
    }
}

impl From<PacketFormatArg> for PacketFormat {
    fn from(arg: PacketFormatArg) -> Self {
        match arg {
            PacketFormatArg::Rpm => Self::Rpm,
            PacketFormatArg::Deb => Self::Deb,
            PacketFormatArg::Msi => Self::Msi,
            PacketFormatArg::Exe => Self::Exe,
        }
    }
}

impl From<ArchitectureArg> for Architecture {
    fn from(arg: ArchitectureArg) -> Self {
        match arg {
            ArchitectureArg::Bit32 => Self::Bit32,
            ArchitectureArg::Bit64 => Self::Bit64,
            ArchitectureArg::Aarch64 => Self::Aarch64,
        }
    }
}

fn agent_query(args: AgentPackageQueryArgs) -> AgentQuery {
    AgentQuery {
        site: args.site,
        agent_version: args.agent_version.into(),
        custom_version: args.custom_version,
        os_type: args.os_type.into(),
        packet_format: args.packet_format.into(),
        architecture: args.architecture.into(),
    }
}

// ── Detail views ────────────────────────────────────────────────────

fn package_detail(p: &AgentPackage) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "File:      {}", p.file_name);
    let _ = writeln!(out, "ID:        {}", p.id);
    let optional = [
        ("Version:  ", p.version.as_deref()),
        ("Status:   ", p.status.as_deref()),
        ("Platform: ", p.platform_type.as_deref()),
        ("Arch:     ", p.os_arch.as_deref()),
        ("SHA1:     ", p.sha1.as_deref()),
    ];
    for (label, value) in optional {
        if let Some(value) = value {
            let _ = writeln!(out, "{label} {value}");
        }
    }
    if let Some(size) = p.file_size {
        let _ = writeln!(out, "Size:      {size} bytes");
    }
    out.trim_end().to_owned()
}

fn download_detail(d: &Downloaded) -> String {
    if d.skipped {
        format!(
            "{} already present at {}, download skipped",
            d.package.file_name,
            d.path.display()
        )
    } else {
        format!(
            "Downloaded {} ({} bytes) to {}",
            d.package.file_name,
            d.bytes,
            d.path.display()
        )
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    console: &Console,
    args: AgentPackagesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        AgentPackagesCommand::Show(query) => {
            let package = console.agent_package(&agent_query(query)).await?;
            let out = output::render_single(&global.output, &package, package_detail, |p| {
                p.file_name.clone()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        AgentPackagesCommand::Download { query, dir } => {
            let downloaded = console
                .download_agent_package(&agent_query(query), &dir)
                .await?;
            let out = output::render_single(&global.output, &downloaded, download_detail, |d| {
                d.path.display().to_string()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}

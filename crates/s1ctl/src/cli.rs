//! Clap derive structures for the `s1ctl` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// s1ctl -- desired-state management for SentinelOne consoles
#[derive(Debug, Parser)]
#[command(
    name = "s1ctl",
    version,
    about = "Manage SentinelOne management console settings from the command line",
    long_about = "Brings sites, groups, filters, policies, path exclusions, config overrides\n\
        and upgrade policies of a SentinelOne management console in line with the\n\
        state given on the command line. Every `apply` is idempotent: it reads the\n\
        current state, diffs it, and only changes what differs.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Console profile to use
    #[arg(long, short = 'p', env = "S1CTL_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Management console URL (overrides profile)
    #[arg(long, short = 'c', env = "S1CTL_CONSOLE", global = true)]
    pub console: Option<String>,

    /// API token
    #[arg(long, env = "S1CTL_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "S1CTL_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept invalid TLS certificates
    #[arg(long, short = 'k', env = "S1CTL_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "S1CTL_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Attempts per request, first one included (overrides profile)
    #[arg(long, env = "S1CTL_RETRIES", global = true)]
    pub retries: Option<u32>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage sites of the account
    Sites(SitesArgs),

    /// Manage static and dynamic groups
    #[command(alias = "grp")]
    Groups(GroupsArgs),

    /// Manage saved filters
    Filters(FiltersArgs),

    /// Manage site and group policies
    #[command(alias = "pol")]
    Policies(PoliciesArgs),

    /// Manage path exclusions
    #[command(alias = "excl")]
    Exclusions(ExclusionsArgs),

    /// Manage agent config overrides
    #[command(alias = "co")]
    ConfigOverrides(ConfigOverridesArgs),

    /// Manage agent upgrade policies
    UpgradePolicies(UpgradePoliciesArgs),

    /// Look up and download agent packages
    #[command(alias = "agents")]
    AgentPackages(AgentPackagesArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Shared Value Enums ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum StateArg {
    #[default]
    Present,
    Absent,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OsTypeArg {
    Windows,
    Linux,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  SITES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct SitesArgs {
    #[command(subcommand)]
    pub command: SitesCommand,
}

#[derive(Debug, Subcommand)]
pub enum SitesCommand {
    /// List all sites of the account
    #[command(alias = "ls")]
    List,

    /// Create, update or delete a site
    Apply(SiteApplyArgs),
}

#[derive(Debug, Args)]
pub struct SiteApplyArgs {
    /// Site name
    #[arg(long)]
    pub name: String,

    #[arg(long, value_enum, default_value = "present")]
    pub state: StateArg,

    #[arg(long, value_enum, default_value = "paid")]
    pub site_type: SiteTypeArg,

    #[arg(long, value_enum, default_value = "core")]
    pub license_type: LicenseTypeArg,

    /// Agent licenses for the site (-1 = unlimited)
    #[arg(long, default_value = "-1", allow_negative_numbers = true)]
    pub total_agents: i64,

    /// Expiration as YYYY-MM-DDTHH:MM+HH:MM, or -1 to inherit from the account
    #[arg(long, default_value = "-1", allow_hyphen_values = true)]
    pub expiration: String,

    #[arg(long, default_value = "")]
    pub description: String,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SiteTypeArg {
    Trial,
    Paid,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LicenseTypeArg {
    Core,
    Control,
    Complete,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  GROUPS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct GroupsArgs {
    #[command(subcommand)]
    pub command: GroupsCommand,
}

#[derive(Debug, Subcommand)]
pub enum GroupsCommand {
    /// List the groups of a site
    #[command(alias = "ls")]
    List {
        /// Site name
        #[arg(long)]
        site: String,
    },

    /// Create, update or delete groups
    Apply(GroupApplyArgs),
}

#[derive(Debug, Args)]
pub struct GroupApplyArgs {
    /// Site name
    #[arg(long)]
    pub site: String,

    /// Group name (repeatable)
    #[arg(long = "name", required = true)]
    pub names: Vec<String>,

    #[arg(long, value_enum, default_value = "present")]
    pub state: StateArg,

    /// Filter backing a dynamic group
    #[arg(long)]
    pub filter: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  FILTERS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct FiltersArgs {
    #[command(subcommand)]
    pub command: FiltersCommand,
}

#[derive(Debug, Subcommand)]
pub enum FiltersCommand {
    /// Create, update or delete a filter
    Apply(FilterApplyArgs),
}

#[derive(Debug, Args)]
pub struct FilterApplyArgs {
    #[arg(long)]
    pub site: String,

    /// Filter name
    #[arg(long)]
    pub name: String,

    #[arg(long, value_enum, default_value = "present")]
    pub state: StateArg,

    /// Filter fields as JSON, or @path to a JSON file
    #[arg(long)]
    pub fields: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  POLICIES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct PoliciesArgs {
    #[command(subcommand)]
    pub command: PoliciesCommand,
}

#[derive(Debug, Subcommand)]
pub enum PoliciesCommand {
    /// Set a policy, or restore inheritance from the parent scope
    Apply(PolicyApplyArgs),
}

#[derive(Debug, Args)]
pub struct PolicyApplyArgs {
    #[arg(long)]
    pub site: String,

    /// Group to apply to instead of the site (repeatable)
    #[arg(long = "group")]
    pub groups: Vec<String>,

    /// Inherit the policy from the parent scope
    #[arg(long, conflicts_with = "policy")]
    pub inherit: bool,

    /// Policy settings as JSON, or @path to a JSON file
    #[arg(long, required_unless_present = "inherit")]
    pub policy: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  EXCLUSIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ExclusionsArgs {
    #[command(subcommand)]
    pub command: ExclusionsCommand,
}

#[derive(Debug, Subcommand)]
pub enum ExclusionsCommand {
    /// Create, recreate or delete a path exclusion
    Apply(ExclusionApplyArgs),
}

#[derive(Debug, Args)]
pub struct ExclusionApplyArgs {
    #[arg(long)]
    pub site: String,

    /// Group to apply to instead of the site (repeatable)
    #[arg(long = "group")]
    pub groups: Vec<String>,

    #[arg(long, value_enum, default_value = "present")]
    pub state: StateArg,

    #[arg(long, value_enum)]
    pub os_type: Option<OsTypeArg>,

    /// Path to exclude; a trailing separator marks a folder
    #[arg(long)]
    pub path: String,

    /// Also exclude subfolders of a folder path
    #[arg(long)]
    pub include_subfolders: bool,

    /// Exclusion function "alerts mitigation"
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub alerts_mitigation: bool,

    /// Exclusion function "binary vault"
    #[arg(long, default_value_t = false, action = clap::ArgAction::Set)]
    pub binary_vault: bool,

    #[arg(long, value_enum)]
    pub mode: Option<ExclusionModeArg>,

    #[arg(long, default_value = "")]
    pub description: String,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ExclusionModeArg {
    SuppressAlerts,
    Interoperability,
    InteroperabilityExtended,
    PerformanceFocus,
    PerformanceFocusExtended,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG OVERRIDES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigOverridesArgs {
    #[command(subcommand)]
    pub command: ConfigOverridesCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigOverridesCommand {
    /// Merge, remove or prune agent config override settings
    Apply(ConfigOverrideApplyArgs),
}

#[derive(Debug, Args)]
pub struct ConfigOverrideApplyArgs {
    #[arg(long)]
    pub site: String,

    /// Group to apply to instead of the site
    #[arg(long)]
    pub group: Option<String>,

    #[arg(long, value_enum, default_value = "present")]
    pub state: OverrideStateArg,

    /// Override name
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long, value_enum)]
    pub os_type: OsTypeArg,

    /// Agent version the override applies to (ALL for every version)
    #[arg(long, default_value = "ALL")]
    pub agent_version: String,

    /// Override settings as JSON, or @path to a JSON file
    #[arg(long)]
    pub config: Option<String>,

    #[arg(long, default_value = "")]
    pub description: String,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OverrideStateArg {
    /// Merge the settings into the override
    Present,
    /// Remove the settings from the override
    Absent,
    /// Delete the whole override
    Prune,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  UPGRADE POLICIES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct UpgradePoliciesArgs {
    #[command(subcommand)]
    pub command: UpgradePoliciesCommand,
}

#[derive(Debug, Subcommand)]
pub enum UpgradePoliciesCommand {
    /// Set maintenance windows and download concurrency
    Apply(UpgradePolicyApplyArgs),
}

#[derive(Debug, Args)]
pub struct UpgradePolicyApplyArgs {
    #[arg(long)]
    pub site: String,

    /// Group to apply to instead of the site (repeatable)
    #[arg(long = "group")]
    pub groups: Vec<String>,

    /// Inherit maintenance windows from the parent scope
    #[arg(long)]
    pub inherit_maintenance_windows: bool,

    /// Inherit the concurrent download limit from the parent scope
    #[arg(long)]
    pub inherit_max_concurrent_downloads: bool,

    /// Day -> [{"from": "hh:mm AM", "to": "hh:mm PM"}] as JSON, or @path
    #[arg(long)]
    pub maintenance_windows: Option<String>,

    #[arg(long)]
    pub max_concurrent_downloads: Option<u64>,

    /// GMT offset of the maintenance windows
    #[arg(long, default_value = "+00:00", allow_hyphen_values = true)]
    pub timezone: String,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  AGENT PACKAGES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct AgentPackagesArgs {
    #[command(subcommand)]
    pub command: AgentPackagesCommand,
}

#[derive(Debug, Subcommand)]
pub enum AgentPackagesCommand {
    /// Show the newest package matching the query
    Show(AgentPackageQueryArgs),

    /// Download the newest package matching the query
    Download {
        #[command(flatten)]
        query: AgentPackageQueryArgs,

        /// Target directory
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
}

#[derive(Debug, Args)]
pub struct AgentPackageQueryArgs {
    /// Only packages visible in this site
    #[arg(long)]
    pub site: Option<String>,

    #[arg(long, value_enum, default_value = "latest")]
    pub agent_version: AgentVersionArg,

    /// Exact version for --agent-version custom
    #[arg(long, required_if_eq("agent_version", "custom"))]
    pub custom_version: Option<String>,

    #[arg(long, value_enum)]
    pub os_type: OsTypeArg,

    #[arg(long, value_enum)]
    pub packet_format: PacketFormatArg,

    #[arg(long, value_enum, default_value = "64_bit")]
    pub architecture: ArchitectureArg,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum AgentVersionArg {
    /// Newest GA release
    Latest,
    /// Newest release including EA
    #[value(name = "latest_ea")]
    LatestEa,
    /// Exact version from --custom-version
    Custom,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PacketFormatArg {
    Rpm,
    Deb,
    Msi,
    Exe,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ArchitectureArg {
    #[value(name = "32_bit")]
    Bit32,
    #[value(name = "64_bit")]
    Bit64,
    #[value(name = "aarch64")]
    Aarch64,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// Set a value on the active profile
    Set {
        /// Profile key (console_url, token_env, ca_cert, insecure, timeout, retries, retry_pause)
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store an API token in the system keyring
    SetToken {
        /// Profile name
        #[arg(long)]
        profile: Option<String>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}

// Agent packages: find the installer matching an OS / format / architecture
// combination, and optionally fetch it to a local directory.

use std::path::{Path, PathBuf};

use serde::Serialize;
use strum::{Display, EnumString};
use tracing::{debug, info};

use s1ctl_api::types::AgentPackage;
use s1ctl_api::{ConsoleClient, PackageQuery};

use super::OsType;
use crate::error::CoreError;
use crate::scope;

/// Which release to pick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum AgentVersion {
    /// Newest GA release.
    #[default]
    Latest,
    /// Newest release of any status (EA included).
    LatestEa,
    /// The exact version in [`AgentQuery::custom_version`].
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum PacketFormat {
    Rpm,
    Deb,
    Msi,
    Exe,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
pub enum Architecture {
    #[strum(serialize = "32_bit")]
    Bit32,
    #[default]
    #[strum(serialize = "64_bit")]
    Bit64,
    #[strum(serialize = "aarch64")]
    Aarch64,
}

impl Architecture {
    /// `64_bit` → `64 bit`, the spelling of the `osArches` filter.
    fn os_arch(self) -> String {
        self.to_string().replace('_', " ")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AgentQuery {
    /// Restrict the search to packages visible in this site.
    pub site: Option<String>,
    pub agent_version: AgentVersion,
    pub custom_version: Option<String>,
    pub os_type: OsType,
    pub packet_format: PacketFormat,
    pub architecture: Architecture,
}

impl AgentQuery {
    pub fn new(os_type: OsType, packet_format: PacketFormat) -> Self {
        Self {
            site: None,
            agent_version: AgentVersion::default(),
            custom_version: None,
            os_type,
            packet_format,
            architecture: Architecture::default(),
        }
    }

    /// Reject contradicting OS / format / architecture combinations.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.architecture == Architecture::Aarch64 && self.os_type != OsType::Linux {
            return Err(CoreError::validation(
                "Error: architecture 'aarch64' needs os_type to be 'Linux'",
            ));
        }

        match self.os_type {
            OsType::Windows
                if !matches!(self.packet_format, PacketFormat::Exe | PacketFormat::Msi) =>
            {
                return Err(CoreError::validation(
                    "Error: 'packet_format' needs to be 'exe' or 'msi' if os_type is 'Windows'",
                ));
            }
            OsType::Linux if !matches!(self.packet_format, PacketFormat::Deb | PacketFormat::Rpm) => {
                return Err(CoreError::validation(
                    "Error: 'packet_format' needs to be 'deb' or 'rpm' if os_type is 'Linux'",
                ));
            }
            _ => {}
        }

        if self.agent_version == AgentVersion::Custom
            && self.custom_version.as_deref().is_none_or(str::is_empty)
        {
            return Err(CoreError::validation(
                "Error: 'custom_version' is required if agent_version is 'custom'",
            ));
        }
        Ok(())
    }

    /// Package search for this query, optionally scoped to a site.
    pub fn to_package_query(&self, site_id: Option<&str>) -> PackageQuery {
        let mut query = PackageQuery {
            platform_type: self.os_type.to_string(),
            file_extension: format!(".{}", self.packet_format),
            site_id: site_id.map(str::to_owned),
            ..PackageQuery::default()
        };

        match self.agent_version {
            AgentVersion::Custom => query.version.clone_from(&self.custom_version),
            AgentVersion::Latest => query.status = Some("ga".to_owned()),
            AgentVersion::LatestEa => {}
        }

        match self.os_type {
            OsType::Linux => {
                let name = if self.architecture == Architecture::Aarch64 {
                    "SentinelAgent-aarch64"
                } else {
                    "SentinelAgent_linux"
                };
                query.query = Some(name.to_owned());
            }
            OsType::Windows => {
                query.package_type = Some("AgentAndRanger".to_owned());
                query.os_arches = Some(self.architecture.os_arch());
            }
        }
        query
    }
}

/// Result of [`download`].
#[derive(Debug, Clone, Serialize)]
pub struct Downloaded {
    pub path: PathBuf,
    pub bytes: u64,
    /// `true` when a file of the expected size was already present.
    pub skipped: bool,
    pub package: AgentPackage,
}

/// Newest package matching the query.
pub(crate) async fn find(
    client: &ConsoleClient,
    query: &AgentQuery,
) -> Result<AgentPackage, CoreError> {
    query.validate()?;
    scope::account(client).await?;
    let site_id = match &query.site {
        Some(name) => Some(scope::require_site(client, name).await?.id),
        None => None,
    };

    let response = client
        .find_agent_packages(&query.to_package_query(site_id.as_deref()))
        .await?;
    if response.total_items() == 0 {
        return Err(CoreError::PackageNotFound);
    }
    let package = response
        .data
        .into_iter()
        .next()
        .ok_or(CoreError::PackageNotFound)?;

    info!(file = %package.file_name, version = ?package.version, "Agent found: {}", package.file_name);
    Ok(package)
}

/// Find the package and store it as `dir/<fileName>`.
pub(crate) async fn download(
    client: &ConsoleClient,
    query: &AgentQuery,
    dir: &Path,
) -> Result<Downloaded, CoreError> {
    let package = find(client, query).await?;
    let link = package.link.clone().ok_or_else(|| {
        CoreError::unexpected(format!(
            "Agent package {} has no download link",
            package.file_name
        ))
    })?;

    let path = dir.join(local_file_name(&package.file_name)?);

    if let (Some(expected), Ok(meta)) = (package.file_size, tokio::fs::metadata(&path).await) {
        if meta.is_file() && meta.len() == expected {
            debug!(path = %path.display(), "package already present, skipping download");
            return Ok(Downloaded {
                path,
                bytes: expected,
                skipped: true,
                package,
            });
        }
    }

    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| io_error(dir, source))?;
    info!(path = %path.display(), "downloading agent package");
    let bytes = client
        .download(&link, &path)
        .await
        .map_err(|err| match err {
            s1ctl_api::Error::Io(source) => io_error(&path, source),
            other => CoreError::from(other),
        })?;

    Ok(Downloaded {
        path,
        bytes,
        skipped: false,
        package,
    })
}

fn io_error(path: &Path, source: std::io::Error) -> CoreError {
    CoreError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// The console-provided file name, reduced to its last path component.
fn local_file_name(file_name: &str) -> Result<&str, CoreError> {
    let name = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    if name.is_empty() || name == "." || name == ".." {
        return Err(CoreError::unexpected(format!(
            "Agent package file name '{file_name}' is not usable as a local file name"
        )));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn aarch64_requires_linux() {
        let mut query = AgentQuery::new(OsType::Windows, PacketFormat::Msi);
        query.architecture = Architecture::Aarch64;
        assert_eq!(
            query.validate().unwrap_err().to_string(),
            "Error: architecture 'aarch64' needs os_type to be 'Linux'"
        );
    }

    #[test]
    fn format_must_fit_os() {
        let query = AgentQuery::new(OsType::Windows, PacketFormat::Deb);
        assert!(query.validate().unwrap_err().to_string().contains("'exe' or 'msi'"));
        let query = AgentQuery::new(OsType::Linux, PacketFormat::Exe);
        assert!(query.validate().unwrap_err().to_string().contains("'deb' or 'rpm'"));
    }

    #[test]
    fn custom_needs_a_version() {
        let mut query = AgentQuery::new(OsType::Linux, PacketFormat::Rpm);
        query.agent_version = AgentVersion::Custom;
        assert!(query.validate().is_err());
        query.custom_version = Some("23.4.2.14".into());
        assert!(query.validate().is_ok());
    }

    #[test]
    fn windows_query_filters_package_type_and_arch() {
        let query = AgentQuery::new(OsType::Windows, PacketFormat::Msi);
        let params = query.to_package_query(Some("7"));
        assert_eq!(
            params,
            PackageQuery {
                platform_type: "windows".into(),
                file_extension: ".msi".into(),
                site_id: Some("7".into()),
                status: Some("ga".into()),
                package_type: Some("AgentAndRanger".into()),
                os_arches: Some("64 bit".into()),
                ..PackageQuery::default()
            }
        );
    }

    #[test]
    fn linux_query_matches_file_name() {
        let mut query = AgentQuery::new(OsType::Linux, PacketFormat::Deb);
        query.architecture = Architecture::Aarch64;
        query.agent_version = AgentVersion::LatestEa;
        let params = query.to_package_query(None);
        assert_eq!(params.query.as_deref(), Some("SentinelAgent-aarch64"));
        assert_eq!(params.status, None);
        assert_eq!(params.os_arches, None);
    }

    #[test]
    fn architecture_parses_underscored_names() {
        assert_eq!("32_bit".parse::<Architecture>().unwrap(), Architecture::Bit32);
        assert_eq!(Architecture::Bit64.os_arch(), "64 bit");
        assert_eq!("latest_ea".parse::<AgentVersion>().unwrap(), AgentVersion::LatestEa);
    }

    #[test]
    fn file_names_are_reduced_to_last_component() {
        assert_eq!(local_file_name("../../etc/agent.deb").unwrap(), "agent.deb");
        assert_eq!(local_file_name("a\\b.msi").unwrap(), "b.msi");
        assert!(local_file_name("..").is_err());
    }
}

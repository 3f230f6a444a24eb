// Agent package endpoints

use crate::client::{ApiRequest, ConsoleClient};
use crate::error::Error;
use crate::types::{AgentPackage, Envelope};

/// Query parameters of `GET update/agent/packages`.
///
/// Packages are always sorted by version, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageQuery {
    pub platform_type: String,
    pub file_extension: String,
    pub site_id: Option<String>,
    pub version: Option<String>,
    pub status: Option<String>,
    pub query: Option<String>,
    pub package_type: Option<String>,
    pub os_arches: Option<String>,
}

impl PackageQuery {
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("platformTypes", self.platform_type.clone()),
            ("sortOrder", "desc".to_owned()),
            ("sortBy", "version".to_owned()),
            ("fileExtension", self.file_extension.clone()),
        ];
        let optional = [
            ("siteIds", &self.site_id),
            ("version", &self.version),
            ("status", &self.status),
            ("query", &self.query),
            ("packageType", &self.package_type),
            ("osArches", &self.os_arches),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                params.push((key, value.clone()));
            }
        }
        params
    }
}

impl ConsoleClient {
    /// `GET update/agent/packages?..`
    pub async fn find_agent_packages(
        &self,
        query: &PackageQuery,
    ) -> Result<Envelope<Vec<AgentPackage>>, Error> {
        let mut request =
            ApiRequest::get("update/agent/packages").context("Failed to get agent packages.");
        for (key, value) in query.to_params() {
            request = request.query(key, value);
        }
        self.execute(&request).await
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn optional_params_are_skipped() {
        let query = PackageQuery {
            platform_type: "linux".into(),
            file_extension: ".deb".into(),
            status: Some("ga".into()),
            ..PackageQuery::default()
        };
        let keys: Vec<_> = query.to_params().into_iter().map(|(k, _)| k).collect();
        assert_eq!(
            keys,
            vec!["platformTypes", "sortOrder", "sortBy", "fileExtension", "status"]
        );
    }
}

//! Cluster info file consumed by the test suites

use std::collections::BTreeMap;
use std::fs;

use camino::Utf8Path;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ClusterError, Result};
use crate::manager::ClusterManager;
use crate::types::{ClusterDescription, ClusterHandle};

const CONSOLE_HOST_PREFIX: &str = "console-openshift-console";
const DASHBOARD_HOST_PREFIX: &str = "rhods-dashboard-redhat-ods-applications";

/// Connection details of one cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ClusterInfo {
    pub ocp_console_url: String,
    pub cluster_version: String,
    pub ocp_api_url: String,
    pub odh_dashboard_url: String,
    pub test_user: UserInfo,
    pub ocp_admin_user: UserInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct UserInfo {
    pub auth_type: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl UserInfo {
    fn new(auth_type: &str, username: &str) -> Self {
        Self {
            auth_type: auth_type.to_string(),
            username: username.to_string(),
            password: None,
        }
    }
}

/// Cluster info keyed by cluster name
pub type ClusterInfoFile = BTreeMap<String, ClusterInfo>;

/// Dashboard route derived from the console route
pub fn dashboard_url(console_url: &str) -> String {
    console_url.replace(CONSOLE_HOST_PREFIX, DASHBOARD_HOST_PREFIX)
}

impl ClusterInfo {
    pub fn from_description(description: &ClusterDescription) -> Result<Self> {
        let console = description.console_url().ok_or_else(|| {
            ClusterError::invalid_document(&description.id, "cluster has no console URL yet")
        })?;
        let api = description.api_url().ok_or_else(|| {
            ClusterError::invalid_document(&description.id, "cluster has no API URL yet")
        })?;

        Ok(Self {
            ocp_console_url: console.to_string(),
            cluster_version: description.version.raw_id.clone(),
            ocp_api_url: api.to_string(),
            odh_dashboard_url: dashboard_url(console),
            test_user: UserInfo::new("ldap-provider-qe", "ldap-admin1"),
            ocp_admin_user: UserInfo::new("htpasswd-cluster-admin", "htpasswd-cluster-admin-user"),
        })
    }
}

/// Fill in the test and admin passwords; empty values are left out
pub fn update_cluster_info(
    path: &Utf8Path,
    cluster: &str,
    test_password: &str,
    admin_password: &str,
) -> Result<()> {
    let content = fs::read_to_string(path)?;
    let mut file: ClusterInfoFile = serde_yaml_ng::from_str(&content)?;

    let entry = file.get_mut(cluster).ok_or_else(|| {
        ClusterError::invalid_document(path.as_str(), format!("no entry for cluster {}", cluster))
    })?;
    if !test_password.is_empty() {
        entry.test_user.password = Some(test_password.to_string());
    }
    if !admin_password.is_empty() {
        entry.ocp_admin_user.password = Some(admin_password.to_string());
    }

    fs::write(path, serde_yaml_ng::to_string(&file)?)?;
    Ok(())
}

impl ClusterManager {
    /// Write the cluster's connection details to `path`
    pub async fn write_cluster_info(
        &self,
        handle: &ClusterHandle,
        path: &Utf8Path,
    ) -> Result<ClusterInfo> {
        let description = self.ocm().describe(handle.id()).await?;
        let cluster_info = ClusterInfo::from_description(&description)?;

        let mut file = ClusterInfoFile::new();
        file.insert(handle.name().to_string(), cluster_info.clone());
        fs::write(path, serde_yaml_ng::to_string(&file)?)?;

        info!("Wrote cluster info for {} to {}", handle.name(), path);
        Ok(cluster_info)
    }
}

//! Cluster creation request
//!
//! The request body OCM expects for a customer-cloud-subscription (CCS)
//! OpenShift Dedicated cluster, built as typed values.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::error::{ClusterError, Result};

/// Channel group that only exists in the stage environment
pub const CANDIDATE_CHANNEL_GROUP: &str = "candidate";

/// What cluster to create
#[derive(Debug, Clone)]
pub struct ClusterSpec {
    pub name: String,
    pub team: String,
    pub fips: bool,
    pub region: String,
    pub compute_nodes: u32,
    pub compute_machine_type: String,
    /// Exact version, `X.Y-latest`, or `None` for the OCM default
    pub openshift_version: Option<String>,
    pub channel_group: String,
    pub cloud: CloudCredentials,
}

impl ClusterSpec {
    pub fn new(name: impl Into<String>, cloud: CloudCredentials) -> Self {
        let (region, machine_type) = match &cloud {
            CloudCredentials::Aws(_) => ("us-east-1", "m5.2xlarge"),
            CloudCredentials::Gcp(_) => ("us-east1", "custom-8-32768"),
        };
        Self {
            name: name.into(),
            team: "ods-qe".to_string(),
            fips: false,
            region: region.to_string(),
            compute_nodes: 2,
            compute_machine_type: machine_type.to_string(),
            openshift_version: None,
            channel_group: "stable".to_string(),
            cloud,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.openshift_version = Some(version.into());
        self
    }

    pub fn with_channel_group(mut self, group: impl Into<String>) -> Self {
        self.channel_group = group.into();
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_compute(mut self, nodes: u32, machine_type: impl Into<String>) -> Self {
        self.compute_nodes = nodes;
        self.compute_machine_type = machine_type.into();
        self
    }

    pub fn with_fips(mut self, fips: bool) -> Self {
        self.fips = fips;
        self
    }

    pub fn with_team(mut self, team: impl Into<String>) -> Self {
        self.team = team.into();
        self
    }

    pub fn is_candidate(&self) -> bool {
        self.channel_group == CANDIDATE_CHANNEL_GROUP
    }

    /// Build the request body for a resolved version
    pub fn to_request(&self, version: Option<&str>) -> CreateClusterRequest {
        let (cloud_provider, aws, gcp) = match &self.cloud {
            CloudCredentials::Aws(creds) => ("aws", Some(creds.clone()), None),
            CloudCredentials::Gcp(account) => ("gcp", None, Some(account.clone())),
        };

        CreateClusterRequest {
            name: self.name.clone(),
            managed: true,
            multi_az: false,
            fips: self.fips,
            product: IdRef::new("osd"),
            ccs: Ccs { enabled: true },
            cloud_provider: IdRef::new(cloud_provider),
            region: IdRef::new(&self.region),
            nodes: Nodes {
                compute: self.compute_nodes,
                compute_machine_type: IdRef::new(&self.compute_machine_type),
            },
            properties: Properties {
                team: self.team.clone(),
            },
            version: VersionRef {
                id: version.map(|v| format!("openshift-v{}", v)),
                channel_group: self.channel_group.clone(),
            },
            aws,
            gcp,
        }
    }
}

/// Cloud account the cluster is created in
#[derive(Debug, Clone)]
pub enum CloudCredentials {
    Aws(AwsCredentials),
    Gcp(GcpServiceAccount),
}

#[derive(Debug, Clone, Serialize)]
pub struct AwsCredentials {
    pub account_id: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

/// GCP service account key, as found in the downloaded key file
#[derive(Debug, Clone, Serialize)]
pub struct GcpServiceAccount {
    #[serde(rename = "type")]
    pub auth_type: String,
    pub project_id: String,
    pub private_key_id: String,
    pub private_key: String,
    pub client_email: String,
    pub client_id: String,
    pub auth_uri: String,
    pub token_uri: String,
    pub auth_provider_x509_cert_url: String,
    pub client_x509_cert_url: String,
}

/// Body of `POST /api/clusters_mgmt/v1/clusters`
#[derive(Debug, Clone, Serialize)]
pub struct CreateClusterRequest {
    pub name: String,
    pub managed: bool,
    pub multi_az: bool,
    pub fips: bool,
    pub product: IdRef,
    pub ccs: Ccs,
    pub cloud_provider: IdRef,
    pub region: IdRef,
    pub nodes: Nodes,
    pub properties: Properties,
    pub version: VersionRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aws: Option<AwsCredentials>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gcp: Option<GcpServiceAccount>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IdRef {
    pub id: String,
}

impl IdRef {
    fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Ccs {
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Nodes {
    pub compute: u32,
    pub compute_machine_type: IdRef,
}

#[derive(Debug, Clone, Serialize)]
pub struct Properties {
    pub team: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct VersionRef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub channel_group: String,
}

static LATEST_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+\.\d+)-latest$").expect("latest regex is valid"));

/// `X.Y` when `requested` has the form `X.Y-latest`
pub fn latest_request(requested: &str) -> Option<&str> {
    LATEST_PATTERN
        .captures(requested)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Pick the last listed version in the `X.Y` stream
pub fn pick_latest(stream: &str, available: &[String]) -> Result<String> {
    let prefix = format!("{}.", stream);
    available
        .iter()
        .filter(|v| v.as_str() == stream || v.starts_with(&prefix))
        .next_back()
        .cloned()
        .ok_or_else(|| ClusterError::NoMatchingVersion {
            version: stream.to_string(),
        })
}

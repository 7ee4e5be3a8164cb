//! Error types for cluster lifecycle operations

use ocmqe_core::{CommandError, PollError};
use thiserror::Error;

/// Result type alias using ocmqe-cluster's error type
pub type Result<T> = std::result::Result<T, ClusterError>;

/// Errors from cluster, add-on, operator and identity operations
#[derive(Error, Debug)]
pub enum ClusterError {
    /// An `ocm` or `oc` command failed
    #[error(transparent)]
    Command(#[from] CommandError),

    /// A lifecycle wait did not converge
    #[error("{operation} wait for '{target}' failed: {source}")]
    Wait {
        operation: &'static str,
        target: String,
        source: PollError<String, CommandError>,
    },

    /// No cluster matches the name, id or external id
    #[error("Cluster not found: {name}")]
    ClusterNotFound { name: String },

    /// The candidate channel group was requested on production OCM
    #[error("Channel group 'candidate' is available only for the stage environment")]
    CandidateOnProduction,

    /// `X.Y-latest` did not match any version OCM offers
    #[error("No supported versions found for {version} in OCM")]
    NoMatchingVersion { version: String },

    /// A cluster object never showed up
    #[error("{kind} '{name}' not found in namespace {namespace}")]
    ObjectNotFound {
        kind: String,
        name: String,
        namespace: String,
    },

    /// An add-on installation did not create a secret it should have
    #[error("Secret '{name}' was not created in namespace {namespace}")]
    SecretMissing { name: String, namespace: String },

    /// The LDAP bind password is not valid base64 text
    #[error("Invalid LDAP bind password: {message}")]
    InvalidBindPassword { message: String },

    /// The cluster has no upgrade to schedule
    #[error("No upgrades available for cluster {cluster}")]
    NoAvailableUpgrade { cluster: String },

    /// A JSON or YAML document does not have the expected shape
    #[error("Invalid document {path}: {message}")]
    InvalidDocument { path: String, message: String },

    /// Downloading a binary failed
    #[error("Failed to download {url}: HTTP {status}")]
    Download { url: String, status: u16 },

    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Core harness error (configuration, poll policy)
    #[error(transparent)]
    Core(#[from] ocmqe_core::Error),
}

impl ClusterError {
    /// Create a cluster not found error
    pub fn cluster_not_found(name: impl Into<String>) -> Self {
        Self::ClusterNotFound { name: name.into() }
    }

    /// Create an object not found error
    pub fn object_not_found(
        kind: impl Into<String>,
        name: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        Self::ObjectNotFound {
            kind: kind.into(),
            name: name.into(),
            namespace: namespace.into(),
        }
    }

    /// Create a secret missing error
    pub fn secret_missing(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self::SecretMissing {
            name: name.into(),
            namespace: namespace.into(),
        }
    }

    /// Create an invalid document error
    pub fn invalid_document(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidDocument {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Check if a lifecycle wait timed out
    pub fn is_wait_timeout(&self) -> bool {
        matches!(self, ClusterError::Wait { source, .. } if source.is_timeout())
    }

    /// Check if a lifecycle wait stopped on a terminal state
    pub fn is_terminal_state(&self) -> bool {
        matches!(self, ClusterError::Wait { source, .. } if source.is_terminal_state())
    }
}

//! Cluster, add-on and description types reported by OCM

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A cluster as known to OCM
///
/// `name` is what the caller asked for (a name, id or external id); `id` is
/// the OCM internal id every `ocm` command takes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterHandle {
    name: String,
    id: String,
}

impl ClusterHandle {
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for ClusterHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// Cluster state as reported by `ocm describe cluster`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ClusterState {
    Validating,
    Waiting,
    Pending,
    Installing,
    Ready,
    Error,
    Hibernating,
    PoweringDown,
    Resuming,
    Uninstalling,
    Unknown(String),
}

impl ClusterState {
    pub fn as_str(&self) -> &str {
        match self {
            ClusterState::Validating => "validating",
            ClusterState::Waiting => "waiting",
            ClusterState::Pending => "pending",
            ClusterState::Installing => "installing",
            ClusterState::Ready => "ready",
            ClusterState::Error => "error",
            ClusterState::Hibernating => "hibernating",
            ClusterState::PoweringDown => "powering_down",
            ClusterState::Resuming => "resuming",
            ClusterState::Uninstalling => "uninstalling",
            ClusterState::Unknown(s) => s,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ClusterState::Error)
    }
}

impl FromStr for ClusterState {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "validating" => ClusterState::Validating,
            "waiting" => ClusterState::Waiting,
            "pending" => ClusterState::Pending,
            "installing" => ClusterState::Installing,
            "ready" => ClusterState::Ready,
            "error" => ClusterState::Error,
            "hibernating" => ClusterState::Hibernating,
            "powering_down" => ClusterState::PoweringDown,
            "resuming" => ClusterState::Resuming,
            "uninstalling" => ClusterState::Uninstalling,
            other => ClusterState::Unknown(other.to_string()),
        })
    }
}

impl From<String> for ClusterState {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(state) => state,
            Err(never) => match never {},
        }
    }
}

impl From<ClusterState> for String {
    fn from(state: ClusterState) -> Self {
        state.as_str().to_string()
    }
}

impl fmt::Display for ClusterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether OCM still knows about a cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterPresence {
    Present,
    Absent,
}

impl fmt::Display for ClusterPresence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClusterPresence::Present => f.write_str("present"),
            ClusterPresence::Absent => f.write_str("absent"),
        }
    }
}

/// Add-on state from `ocm list addons`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddonState {
    NotInstalled,
    Installing,
    Ready,
    Failed,
    Deleting,
    Other(String),
}

impl AddonState {
    pub fn as_str(&self) -> &str {
        match self {
            AddonState::NotInstalled => "not installed",
            AddonState::Installing => "installing",
            AddonState::Ready => "ready",
            AddonState::Failed => "failed",
            AddonState::Deleting => "deleting",
            AddonState::Other(s) => s,
        }
    }

    /// Anything other than `not installed` counts as installed
    pub fn is_installed(&self) -> bool {
        !matches!(self, AddonState::NotInstalled)
    }
}

impl FromStr for AddonState {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "not installed" => AddonState::NotInstalled,
            "installing" => AddonState::Installing,
            "ready" => AddonState::Ready,
            "failed" => AddonState::Failed,
            "deleting" => AddonState::Deleting,
            other => AddonState::Other(other.to_string()),
        })
    }
}

impl fmt::Display for AddonState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Subset of `ocm describe cluster --json` used by the harness
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterDescription {
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub external_id: Option<String>,

    pub state: ClusterState,

    #[serde(default)]
    pub version: VersionInfo,

    #[serde(default)]
    pub console: Option<Endpoint>,

    #[serde(default)]
    pub api: Option<Endpoint>,
}

impl ClusterDescription {
    pub fn console_url(&self) -> Option<&str> {
        self.console
            .as_ref()
            .map(|c| c.url.as_str())
            .filter(|u| !u.is_empty())
    }

    pub fn api_url(&self) -> Option<&str> {
        self.api
            .as_ref()
            .map(|a| a.url.as_str())
            .filter(|u| !u.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    #[serde(default)]
    pub raw_id: String,

    #[serde(default)]
    pub channel_group: Option<String>,

    #[serde(default)]
    pub available_upgrades: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    #[serde(default)]
    pub url: String,
}

//! Settings for the external CLIs and the settle delays between steps

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default download location for the ocm CLI
pub const DEFAULT_OCM_CLI_URL: &str =
    "https://github.com/openshift-online/ocm-cli/releases/download/v0.1.55/ocm-linux-amd64";

/// OCM environment the harness talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Production OCM
    Prod,

    /// Staging OCM
    #[default]
    Stage,
}

impl Environment {
    /// Name used in `ocm.json.<env>` config files
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Prod => "prod",
            Environment::Stage => "stage",
        }
    }

    /// Config file name holding the ocm login for this environment
    pub fn config_file_name(&self) -> String {
        format!("ocm.json.{}", self.as_str())
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "prod" => Ok(Environment::Prod),
            "stage" => Ok(Environment::Stage),
            other => Err(Error::invalid_environment(other)),
        }
    }
}

/// Settings for the `ocm` CLI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OcmSettings {
    /// ocm binary name or path
    #[serde(default = "default_ocm_binary")]
    pub binary: String,

    /// `--v` level passed to create/update/delete commands
    #[serde(default)]
    pub verbose_level: u8,

    /// Environment to log in to
    #[serde(default)]
    pub environment: Environment,

    /// `OCM_CONFIG` file used for every ocm invocation
    #[serde(default)]
    pub config_file: Option<Utf8PathBuf>,

    /// Where to download the ocm CLI from when it is missing
    #[serde(default = "default_cli_url")]
    pub cli_url: String,
}

fn default_ocm_binary() -> String {
    "ocm".to_string()
}

fn default_cli_url() -> String {
    DEFAULT_OCM_CLI_URL.to_string()
}

impl Default for OcmSettings {
    fn default() -> Self {
        Self {
            binary: default_ocm_binary(),
            verbose_level: 0,
            environment: Environment::default(),
            config_file: None,
            cli_url: default_cli_url(),
        }
    }
}

impl OcmSettings {
    /// Look for an existing `ocm.json.<env>` in `dir`
    ///
    /// The environment is taken from the file suffix. Files with an
    /// unrecognised suffix are skipped.
    pub fn discover_config(dir: &Utf8Path) -> Option<(Utf8PathBuf, Environment)> {
        let pattern = dir.join("ocm.json.*");
        let entries = glob::glob(pattern.as_str()).ok()?;

        let mut found: Vec<(Utf8PathBuf, Environment)> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|path| Utf8PathBuf::from_path_buf(path).ok())
            .filter_map(|path| {
                let env = path.extension()?.parse::<Environment>().ok()?;
                Some((path, env))
            })
            .collect();

        found.sort_by(|a, b| a.0.cmp(&b.0));
        found.into_iter().next()
    }

    /// Apply a discovered config file, if any
    pub fn with_discovered_config(mut self, dir: &Utf8Path) -> Self {
        if let Some((path, env)) = Self::discover_config(dir) {
            self.config_file = Some(path);
            self.environment = env;
        }
        self
    }
}

/// Settings for the `oc` CLI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OcSettings {
    /// oc binary name or path
    #[serde(default = "default_oc_binary")]
    pub binary: String,
}

fn default_oc_binary() -> String {
    "oc".to_string()
}

impl Default for OcSettings {
    fn default() -> Self {
        Self {
            binary: default_oc_binary(),
        }
    }
}

/// Fixed waits after a step has converged
///
/// OCM reports `ready` before every service on the cluster is actually up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SettleConfig {
    /// After a cluster becomes ready
    #[serde(default = "default_settle_secs")]
    pub cluster_secs: u64,

    /// After a product add-on is installed
    #[serde(default = "default_settle_secs")]
    pub addon_secs: u64,

    /// After an identity provider is created
    #[serde(default = "default_settle_secs")]
    pub idp_secs: u64,

    /// After a machine pool is created
    #[serde(default = "default_machine_pool_settle_secs")]
    pub machine_pool_secs: u64,
}

fn default_settle_secs() -> u64 {
    300
}

fn default_machine_pool_settle_secs() -> u64 {
    60
}

impl Default for SettleConfig {
    fn default() -> Self {
        Self {
            cluster_secs: default_settle_secs(),
            addon_secs: default_settle_secs(),
            idp_secs: default_settle_secs(),
            machine_pool_secs: default_machine_pool_settle_secs(),
        }
    }
}

impl SettleConfig {
    /// No settle delays at all
    pub fn none() -> Self {
        Self {
            cluster_secs: 0,
            addon_secs: 0,
            idp_secs: 0,
            machine_pool_secs: 0,
        }
    }

    pub fn cluster(&self) -> Duration {
        Duration::from_secs(self.cluster_secs)
    }

    pub fn addon(&self) -> Duration {
        Duration::from_secs(self.addon_secs)
    }

    pub fn idp(&self) -> Duration {
        Duration::from_secs(self.idp_secs)
    }

    pub fn machine_pool(&self) -> Duration {
        Duration::from_secs(self.machine_pool_secs)
    }
}

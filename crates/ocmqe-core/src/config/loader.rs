//! Configuration file loading and parsing

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::types::{OcSettings, OcmSettings, PollPoliciesConfig, SettleConfig};

/// Configuration file names to search for
pub const CONFIG_FILE_NAMES: &[&str] = &["ocmqe.yaml", "ocmqe.yml"];

/// Harness configuration (ocmqe.yaml)
///
/// Every section is optional; missing values fall back to the harness
/// defaults.
///
/// ```yaml
/// ocm:
///   environment: prod
///   verbose-level: 1
/// polling:
///   operations:
///     cluster-ready:
///       interval-secs: 30
///       timeout-secs: 5400
/// settle:
///   cluster-secs: 0
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct HarnessConfig {
    #[serde(default)]
    pub ocm: OcmSettings,

    #[serde(default)]
    pub oc: OcSettings,

    #[serde(default)]
    pub polling: PollPoliciesConfig,

    #[serde(default)]
    pub settle: SettleConfig,
}

impl HarnessConfig {
    /// Load configuration from the specified path or search for it
    pub fn load(path: Option<&Utf8Path>) -> Result<Self> {
        let (config_path, content) = match path {
            Some(p) => {
                let content = fs::read_to_string(p).map_err(|e| {
                    if e.kind() == std::io::ErrorKind::NotFound {
                        Error::config_not_found(p.as_str())
                    } else {
                        Error::Io(e)
                    }
                })?;
                (p.to_owned(), content)
            }
            None => Self::find_config()?,
        };

        debug!("Loading harness configuration from {}", config_path);
        Self::from_yaml_str(&content)
    }

    /// Load configuration, falling back to defaults when no file exists
    ///
    /// A file that exists but does not parse is still an error.
    pub fn load_or_default(path: Option<&Utf8Path>) -> Result<Self> {
        match Self::load(path) {
            Err(Error::ConfigNotFound { path }) => {
                debug!("No harness configuration found ({}), using defaults", path);
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Parse and validate configuration from YAML text
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: HarnessConfig = if content.trim().is_empty() {
            HarnessConfig::default()
        } else {
            serde_yaml_ng::from_str(content)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject poll policies that cannot drive a polling session
    pub fn validate(&self) -> Result<()> {
        self.polling.default.validate()?;
        for (operation, policy) in &self.polling.operations {
            policy.validate().map_err(|e| {
                Error::invalid_config(format!("polling.operations.{}: {}", operation, e))
            })?;
        }
        Ok(())
    }

    /// Search the current directory and its parents
    fn find_config() -> Result<(Utf8PathBuf, String)> {
        let cwd = std::env::current_dir().map_err(Error::Io)?;
        let cwd = Utf8PathBuf::try_from(cwd)
            .map_err(|_| Error::invalid_config("Current directory path is not valid UTF-8"))?;
        Self::find_config_from(&cwd)
    }

    fn find_config_from(start: &Utf8Path) -> Result<(Utf8PathBuf, String)> {
        let mut current = start;

        loop {
            for name in CONFIG_FILE_NAMES {
                let path = current.join(name);
                if path.exists() {
                    let content = fs::read_to_string(&path)?;
                    return Ok((path, content));
                }
            }

            match current.parent() {
                Some(parent) => current = parent,
                None => break,
            }
        }

        Err(Error::config_not_found(
            "ocmqe.yaml (searched current and parent directories)",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Environment, ProbeErrorPolicy};
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = HarnessConfig::from_yaml_str("").unwrap();
        assert_eq!(config.ocm.binary, "ocm");
        assert_eq!(config.oc.binary, "oc");
        assert_eq!(config.ocm.environment, Environment::Stage);
        assert_eq!(config.settle.cluster(), Duration::from_secs(300));
        assert_eq!(
            config.polling.for_operation("cluster-ready").timeout(),
            Duration::from_secs(7200)
        );
    }

    #[test]
    fn test_partial_operations_keep_other_defaults() {
        let yaml = r#"
ocm:
  environment: prod
  verbose-level: 2
polling:
  operations:
    cluster-ready:
      interval-secs: 30
      timeout-secs: 5400
"#;
        let config = HarnessConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.ocm.environment, Environment::Prod);
        assert_eq!(config.ocm.verbose_level, 2);

        let ready = config.polling.for_operation("cluster-ready");
        assert_eq!(ready.interval(), Duration::from_secs(30));
        assert_eq!(ready.timeout(), Duration::from_secs(5400));

        let exists = config.polling.for_operation("object-exists");
        assert_eq!(exists.interval(), Duration::from_secs(3));
        assert_eq!(exists.on_probe_error, ProbeErrorPolicy::Continue);
    }

    #[test]
    fn test_partial_operation_entry_merges_field_by_field() {
        let yaml = r#"
polling:
  operations:
    object-exists:
      interval-secs: 5
    cluster-ready:
      interval-secs: 30
"#;
        let config = HarnessConfig::from_yaml_str(yaml).unwrap();

        let exists = config.polling.for_operation("object-exists");
        assert_eq!(exists.interval(), Duration::from_secs(5));
        assert_eq!(exists.timeout(), Duration::from_secs(102));
        assert_eq!(exists.on_probe_error, ProbeErrorPolicy::Continue);

        let ready = config.polling.for_operation("cluster-ready");
        assert_eq!(ready.interval(), Duration::from_secs(30));
        assert_eq!(ready.timeout(), Duration::from_secs(7200));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let yaml = r#"
polling:
  operations:
    addon-installed:
      interval-secs: 0
"#;
        let err = HarnessConfig::from_yaml_str(yaml).unwrap_err();
        assert!(err.to_string().contains("addon-installed"));
    }

    #[test]
    fn test_unknown_environment_rejected() {
        let yaml = "ocm:\n  environment: int\n";
        assert!(matches!(
            HarnessConfig::from_yaml_str(yaml),
            Err(Error::YamlParse(_))
        ));
    }

    #[test]
    fn test_explicit_path_not_found() {
        let missing = Utf8Path::new("/nonexistent/ocmqe.yaml");
        let err = HarnessConfig::load(Some(missing)).unwrap_err();
        assert!(matches!(err, Error::ConfigNotFound { .. }));

        let config = HarnessConfig::load_or_default(Some(missing)).unwrap();
        assert_eq!(config.ocm.binary, "ocm");
    }

    #[test]
    fn test_find_config_walks_parents() {
        let dir = TempDir::new().unwrap();
        let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();
        let nested = root.join("a/b/c");
        fs::create_dir_all(&nested).unwrap();
        let yaml = "oc:\n  binary: /usr/local/bin/oc\n";
        fs::write(root.join("ocmqe.yml"), yaml).unwrap();

        let (path, content) = HarnessConfig::find_config_from(&nested).unwrap();
        assert_eq!(path, root.join("ocmqe.yml"));

        let config = HarnessConfig::from_yaml_str(&content).unwrap();
        assert_eq!(config.oc.binary, "/usr/local/bin/oc");
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = TempDir::new().unwrap();
        let path = Utf8PathBuf::try_from(dir.path().join("custom.yaml")).unwrap();
        let yaml = "settle:\n  cluster-secs: 0\n  idp-secs: 10\n";
        fs::write(&path, yaml).unwrap();

        let config = HarnessConfig::load(Some(&path)).unwrap();
        assert_eq!(config.settle.cluster(), Duration::ZERO);
        assert_eq!(config.settle.idp(), Duration::from_secs(10));
        assert_eq!(config.settle.machine_pool(), Duration::from_secs(60));
    }
}

//! Poll policy configuration
//!
//! Every lifecycle wait is driven by a [`PollPolicy`] looked up by operation
//! key in [`PollPoliciesConfig`]. Defaults reproduce the wait budgets the
//! harness has always used against OCM.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Operation key: cluster reaches `ready` after creation
pub const CLUSTER_READY: &str = "cluster-ready";
/// Operation key: cluster reaches `hibernating`
pub const CLUSTER_HIBERNATED: &str = "cluster-hibernated";
/// Operation key: cluster returns to `ready` after resume
pub const CLUSTER_RESUMED: &str = "cluster-resumed";
/// Operation key: cluster disappears from OCM
pub const CLUSTER_DELETED: &str = "cluster-deleted";
/// Operation key: add-on reaches `ready`
pub const ADDON_INSTALLED: &str = "addon-installed";
/// Operation key: add-on reaches `not installed`
pub const ADDON_UNINSTALLED: &str = "addon-uninstalled";
/// Operation key: operator CSV reaches `Succeeded`
pub const OPERATOR_INSTALLED: &str = "operator-installed";
/// Operation key: a cluster object becomes visible through `oc get`
pub const OBJECT_EXISTS: &str = "object-exists";

/// What a polling session does when the probe itself fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ProbeErrorPolicy {
    /// Stop immediately with a terminal failure
    #[default]
    Abort,

    /// Report the failure and keep polling until the deadline
    Continue,
}

/// Poll policy for one kind of wait
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PollPolicy {
    /// Delay between probes in seconds
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Overall budget for the session in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Behaviour on probe infrastructure failure
    #[serde(default)]
    pub on_probe_error: ProbeErrorPolicy,
}

fn default_interval_secs() -> u64 {
    60
}

fn default_timeout_secs() -> u64 {
    3600
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            timeout_secs: default_timeout_secs(),
            on_probe_error: ProbeErrorPolicy::default(),
        }
    }
}

impl PollPolicy {
    /// Create a policy that aborts on probe failure
    pub fn new(interval_secs: u64, timeout_secs: u64) -> Self {
        Self {
            interval_secs,
            timeout_secs,
            on_probe_error: ProbeErrorPolicy::Abort,
        }
    }

    /// Set the probe error policy
    pub fn with_probe_error_policy(mut self, policy: ProbeErrorPolicy) -> Self {
        self.on_probe_error = policy;
        self
    }

    /// Delay between probes
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Overall budget for the session
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Check that the policy can drive a session
    pub fn validate(&self) -> Result<()> {
        if self.interval_secs == 0 {
            return Err(Error::invalid_poll_policy("interval-secs must be > 0"));
        }
        Ok(())
    }
}

/// Poll policy fields set in a configuration file
///
/// Each field left out keeps the value of the policy it is laid over.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PollPolicyOverride {
    pub interval_secs: Option<u64>,
    pub timeout_secs: Option<u64>,
    pub on_probe_error: Option<ProbeErrorPolicy>,
}

impl PollPolicyOverride {
    /// Lay the set fields over `base`
    pub fn apply_to(&self, base: &PollPolicy) -> PollPolicy {
        PollPolicy {
            interval_secs: self.interval_secs.unwrap_or(base.interval_secs),
            timeout_secs: self.timeout_secs.unwrap_or(base.timeout_secs),
            on_probe_error: self.on_probe_error.unwrap_or(base.on_probe_error),
        }
    }
}

/// On-disk shape of the `polling` section
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct PollPoliciesFile {
    #[serde(default)]
    default: PollPolicyOverride,

    #[serde(default)]
    operations: HashMap<String, PollPolicyOverride>,
}

impl From<PollPoliciesFile> for PollPoliciesConfig {
    fn from(file: PollPoliciesFile) -> Self {
        let default = file.default.apply_to(&PollPolicy::default());
        let mut operations = default_operations();
        for (key, fields) in file.operations {
            let base = operations
                .get(&key)
                .cloned()
                .unwrap_or_else(|| default.clone());
            operations.insert(key, fields.apply_to(&base));
        }
        Self {
            default,
            operations,
        }
    }
}

/// Poll policies keyed by operation
///
/// When deserialized, every operation entry is merged field by field over
/// the built-in policy for the same key, or over `default` for keys without
/// one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", from = "PollPoliciesFile")]
pub struct PollPoliciesConfig {
    /// Policy for operations without an explicit entry
    pub default: PollPolicy,

    /// Per-operation policies
    pub operations: HashMap<String, PollPolicy>,
}

fn default_operations() -> HashMap<String, PollPolicy> {
    let mut operations = HashMap::new();
    operations.insert(CLUSTER_READY.to_string(), PollPolicy::new(60, 7200));
    operations.insert(CLUSTER_HIBERNATED.to_string(), PollPolicy::new(60, 1800));
    operations.insert(CLUSTER_RESUMED.to_string(), PollPolicy::new(60, 3600));
    operations.insert(CLUSTER_DELETED.to_string(), PollPolicy::new(60, 5400));
    operations.insert(ADDON_INSTALLED.to_string(), PollPolicy::new(60, 3600));
    operations.insert(ADDON_UNINSTALLED.to_string(), PollPolicy::new(60, 3600));
    operations.insert(OPERATOR_INSTALLED.to_string(), PollPolicy::new(60, 300));
    // 35 lookups, three seconds apart
    operations.insert(
        OBJECT_EXISTS.to_string(),
        PollPolicy::new(3, 102)
            .with_probe_error_policy(ProbeErrorPolicy::Continue),
    );
    operations
}

impl Default for PollPoliciesConfig {
    fn default() -> Self {
        Self {
            default: PollPolicy::default(),
            operations: default_operations(),
        }
    }
}

impl PollPoliciesConfig {
    /// Policy for an operation key, falling back to the default policy
    pub fn for_operation(&self, operation: &str) -> &PollPolicy {
        self.operations.get(operation).unwrap_or(&self.default)
    }

    /// Override the policy for a single operation
    pub fn with_operation(mut self, operation: impl Into<String>, policy: PollPolicy) -> Self {
        self.operations.insert(operation.into(), policy);
        self
    }

    /// Apply the same policy to every known operation and the default
    pub fn uniform(policy: PollPolicy) -> Self {
        let operations = default_operations()
            .into_keys()
            .map(|key| (key, policy.clone()))
            .collect();
        Self {
            default: policy,
            operations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_budgets() {
        let config = PollPoliciesConfig::default();
        assert_eq!(config.for_operation(CLUSTER_READY).timeout_secs, 7200);
        assert_eq!(config.for_operation(CLUSTER_DELETED).timeout_secs, 5400);
        assert_eq!(config.for_operation(OPERATOR_INSTALLED).timeout_secs, 300);
        assert_eq!(
            config.for_operation(OBJECT_EXISTS).on_probe_error,
            ProbeErrorPolicy::Continue
        );
        assert_eq!(config.for_operation("unknown"), &PollPolicy::default());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let policy = PollPolicy::new(0, 60);
        assert!(matches!(
            policy.validate(),
            Err(Error::InvalidPollPolicy { .. })
        ));
        assert!(PollPolicy::new(1, 0).validate().is_ok());
    }

    #[test]
    fn test_deserialize_kebab_case() {
        let yaml = r#"
default:
  interval-secs: 10
operations:
  cluster-ready:
    interval-secs: 30
    timeout-secs: 900
    on-probe-error: continue
"#;
        let config: PollPoliciesConfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(config.default.interval_secs, 10);
        assert_eq!(config.default.timeout_secs, 3600);
        let ready = config.for_operation(CLUSTER_READY);
        assert_eq!(ready.interval(), Duration::from_secs(30));
        assert_eq!(ready.timeout_secs, 900);
        assert_eq!(ready.on_probe_error, ProbeErrorPolicy::Continue);
        assert_eq!(config.for_operation(CLUSTER_DELETED).timeout_secs, 5400);
    }

    #[test]
    fn test_partial_entry_keeps_builtin_fields() {
        let yaml = r#"
operations:
  object-exists:
    interval-secs: 5
  cluster-ready:
    interval-secs: 30
"#;
        let config: PollPoliciesConfig = serde_yaml_ng::from_str(yaml).unwrap();

        let exists = config.for_operation(OBJECT_EXISTS);
        assert_eq!(exists.interval_secs, 5);
        assert_eq!(exists.timeout_secs, 102);
        assert_eq!(exists.on_probe_error, ProbeErrorPolicy::Continue);

        let ready = config.for_operation(CLUSTER_READY);
        assert_eq!(ready.interval_secs, 30);
        assert_eq!(ready.timeout_secs, 7200);
        assert_eq!(ready.on_probe_error, ProbeErrorPolicy::Abort);
    }

    #[test]
    fn test_unknown_operation_merges_over_default() {
        let yaml = r#"
default:
  timeout-secs: 600
operations:
  route-admitted:
    interval-secs: 10
"#;
        let config: PollPoliciesConfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(config.default, PollPolicy::new(60, 600));
        assert_eq!(
            config.for_operation("route-admitted"),
            &PollPolicy::new(10, 600)
        );
    }

    #[test]
    fn test_serialized_config_reads_back_unchanged() {
        let config = PollPoliciesConfig::default()
            .with_operation(CLUSTER_DELETED, PollPolicy::new(30, 900));
        let yaml = serde_yaml_ng::to_string(&config).unwrap();
        let parsed: PollPoliciesConfig = serde_yaml_ng::from_str(&yaml).unwrap();
        assert_eq!(parsed.operations, config.operations);
    }

    #[test]
    fn test_uniform() {
        let config = PollPoliciesConfig::uniform(PollPolicy::new(1, 5));
        assert_eq!(config.for_operation(CLUSTER_READY).timeout_secs, 5);
        assert_eq!(config.for_operation(OBJECT_EXISTS).interval_secs, 1);
    }
}

//! Type definitions shared by the harness configuration and the poller

mod ocm_types;
mod poll_policy;

pub use ocm_types::{Environment, OcSettings, OcmSettings, SettleConfig, DEFAULT_OCM_CLI_URL};
pub use poll_policy::{
    PollPoliciesConfig, PollPolicy, PollPolicyOverride, ProbeErrorPolicy, ADDON_INSTALLED,
    ADDON_UNINSTALLED, CLUSTER_DELETED, CLUSTER_HIBERNATED, CLUSTER_READY, CLUSTER_RESUMED,
    OBJECT_EXISTS, OPERATOR_INSTALLED,
};

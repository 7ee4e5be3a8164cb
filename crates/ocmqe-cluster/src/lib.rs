//! Managed OpenShift cluster lifecycle for the ocmqe harness
//!
//! This crate drives OpenShift Dedicated clusters through the `ocm` and `oc`
//! command-line tools:
//!
//! - Create, hibernate, resume and delete clusters
//! - Install and uninstall product add-ons (RHODS, GPU, RHOAM, Starburst)
//! - Subscribe to operators and wait for their CSVs
//! - Machine pools, identity providers, users and groups
//! - The cluster info file, candidate version ledger and upgrade policies
//!
//! Every wait is a polling session of the condition poller from
//! `ocmqe-core`, configured per operation.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use ocmqe_cluster::{ClusterManager, ClusterSpec, CloudCredentials};
//! use ocmqe_core::{HarnessConfig, SystemRunner};
//!
//! let config = HarnessConfig::load_or_default(None)?;
//! let mut manager = ClusterManager::new(Arc::new(SystemRunner::new()), config);
//! manager.login(&token, Environment::Stage).await?;
//!
//! let handle = manager
//!     .create_cluster(&ClusterSpec::new("qe-cluster", credentials).with_version("4.14-latest"))
//!     .await?;
//! manager.install_rhods(&handle, "qe@example.com").await?;
//! manager.hibernate_cluster(&handle).await?;
//! ```
//!
//! # Architecture
//!
//! ```text
//! ClusterManager
//! ├── Ocm   (ocm CLI: clusters, add-ons, idps, machine pools)
//! ├── Oc    (oc CLI: manifests, objects, groups)
//! └── Poller (ocmqe-core) per wait, with the operation's poll policy
//! ```

pub mod addons;
pub mod create;
pub mod error;
pub mod identity;
pub mod info;
pub mod installer;
pub mod lifecycle;
pub mod machinepool;
pub mod manager;
pub mod oc;
pub mod ocm;
pub mod operators;
pub mod types;
pub mod upgrade;
pub mod versions;

pub use addons::AddonInstall;
pub use create::{AwsCredentials, CloudCredentials, ClusterSpec, GcpServiceAccount};
pub use error::{ClusterError, Result};
pub use identity::{GroupSyncReport, HtpasswdIdp, IdentityProvider, LdapIdp, Membership};
pub use info::{update_cluster_info, ClusterInfo};
pub use machinepool::MachinePoolSpec;
pub use manager::ClusterManager;
pub use operators::OperatorSubscription;
pub use types::{AddonState, ClusterDescription, ClusterHandle, ClusterPresence, ClusterState};
pub use versions::VersionLedger;

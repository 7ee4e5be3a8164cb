//! Cluster create, delete, hibernate and resume

use ocmqe_core::types::{
    Environment, CLUSTER_DELETED, CLUSTER_HIBERNATED, CLUSTER_READY, CLUSTER_RESUMED,
};
use tracing::{info, warn};

use crate::create::{latest_request, pick_latest, ClusterSpec, CANDIDATE_CHANNEL_GROUP};
use crate::error::{ClusterError, Result};
use crate::manager::ClusterManager;
use crate::ocm::CLUSTERS_API;
use crate::types::{ClusterHandle, ClusterPresence, ClusterState};

impl ClusterManager {
    /// Create a cluster and wait until it is ready
    pub async fn create_cluster(&self, spec: &ClusterSpec) -> Result<ClusterHandle> {
        if spec.is_candidate() && self.ocm().settings().environment == Environment::Prod {
            return Err(ClusterError::CandidateOnProduction);
        }

        let version = self.resolve_version(spec).await?;
        match &version {
            Some(v) => info!(
                "Creating cluster {} with OpenShift {}",
                spec.name, v
            ),
            None => info!(
                "Creating cluster {} with the default OpenShift version",
                spec.name
            ),
        }

        let request = spec.to_request(version.as_deref());
        self.ocm().post_json(CLUSTERS_API, &request).await?;

        let handle = self.resolve(&spec.name).await?;
        self.wait_for_ready(&handle).await?;
        info!("Cluster {} is ready", handle);

        self.settle_for(&spec.name, self.settle().cluster()).await;
        Ok(handle)
    }

    /// Turn `X.Y-latest` into the newest matching version OCM offers
    async fn resolve_version(&self, spec: &ClusterSpec) -> Result<Option<String>> {
        let requested = match spec.openshift_version.as_deref() {
            Some(v) if !v.is_empty() => v,
            _ => return Ok(None),
        };

        let Some(stream) = latest_request(requested) else {
            return Ok(Some(requested.to_string()));
        };

        let group = spec.is_candidate().then_some(CANDIDATE_CHANNEL_GROUP);
        let available = self.ocm().list_versions(group).await?;
        pick_latest(stream, &available).map(Some)
    }

    /// Check whether a cluster with this name, id or external id exists
    pub async fn cluster_exists(&self, name: &str) -> Result<bool> {
        match self.resolve(name).await {
            Ok(_) => Ok(true),
            Err(ClusterError::ClusterNotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Delete a cluster and wait until OCM no longer knows it
    pub async fn delete_cluster(&self, handle: &ClusterHandle) -> Result<()> {
        info!("Deleting cluster {}", handle);
        self.ocm().run_verb(["delete", "cluster", handle.id()]).await?;
        self.wait_for_deleted(handle).await?;
        info!("Cluster {} was deleted", handle.name());
        Ok(())
    }

    /// Hibernate a cluster and wait for the `hibernating` state
    pub async fn hibernate_cluster(&self, handle: &ClusterHandle) -> Result<()> {
        info!("Hibernating cluster {}", handle);
        self.ocm().run_verb(["hibernate", "cluster", handle.id()]).await?;
        self.wait_for_hibernated(handle).await?;
        Ok(())
    }

    /// Resume a hibernated cluster and wait for it to be ready
    pub async fn resume_cluster(&self, handle: &ClusterHandle) -> Result<()> {
        info!("Resuming cluster {}", handle);
        self.ocm().run_verb(["resume", "cluster", handle.id()]).await?;
        self.wait_for_resumed(handle).await?;
        Ok(())
    }

    pub async fn wait_for_ready(&self, handle: &ClusterHandle) -> Result<ClusterState> {
        self.wait_for_state(CLUSTER_READY, handle, ClusterState::Ready)
            .await
    }

    pub async fn wait_for_hibernated(&self, handle: &ClusterHandle) -> Result<ClusterState> {
        self.wait_for_state(CLUSTER_HIBERNATED, handle, ClusterState::Hibernating)
            .await
    }

    pub async fn wait_for_resumed(&self, handle: &ClusterHandle) -> Result<ClusterState> {
        self.wait_for_state(CLUSTER_RESUMED, handle, ClusterState::Ready)
            .await
    }

    /// Wait until `ocm describe` reports the cluster as gone
    pub async fn wait_for_deleted(&self, handle: &ClusterHandle) -> Result<()> {
        self.wait_for(
            CLUSTER_DELETED,
            handle.name(),
            || self.ocm().cluster_presence(handle.id()),
            |presence| *presence == ClusterPresence::Absent,
            |_| false,
        )
        .await?;
        Ok(())
    }

    async fn wait_for_state(
        &self,
        operation: &'static str,
        handle: &ClusterHandle,
        target: ClusterState,
    ) -> Result<ClusterState> {
        let state = self
            .wait_for(
                operation,
                handle.name(),
                || self.ocm().cluster_state(handle.id()),
                |state| *state == target,
                ClusterState::is_error,
            )
            .await;

        if let Err(ClusterError::Wait { source, .. }) = &state {
            if source.is_terminal_state() {
                warn!("Cluster {} is in error state", handle.name());
            }
        }
        state
    }
}

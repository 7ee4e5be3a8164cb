//! Machine pools

use tracing::info;

use crate::error::Result;
use crate::manager::ClusterManager;
use crate::types::ClusterHandle;

/// A machine pool to add to a cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachinePoolSpec {
    pub name: String,
    pub instance_type: String,
    pub replicas: u32,
    /// Keep an existing pool with the same name instead of creating one
    pub reuse: bool,
}

impl MachinePoolSpec {
    pub fn new(name: impl Into<String>, instance_type: impl Into<String>, replicas: u32) -> Self {
        Self {
            name: name.into(),
            instance_type: instance_type.into(),
            replicas,
            reuse: false,
        }
    }

    pub fn reuse_existing(mut self, reuse: bool) -> Self {
        self.reuse = reuse;
        self
    }
}

/// Whether `name` appears as a whole word in `ocm list machinepools` output
pub(crate) fn listing_has_pool(listing: &str, name: &str) -> bool {
    listing
        .lines()
        .skip(1)
        .any(|line| line.split_whitespace().any(|word| word == name))
}

impl ClusterManager {
    pub async fn machine_pool_exists(
        &self,
        handle: &ClusterHandle,
        name: &str,
    ) -> Result<bool> {
        let output = self
            .ocm()
            .query_with(|inv| inv.args(["list", "machinepools", "--cluster", handle.id()]))
            .await?;
        Ok(listing_has_pool(&output.stdout, name))
    }

    /// Add a machine pool, or reuse one when asked to and it exists
    pub async fn add_machine_pool(
        &self,
        handle: &ClusterHandle,
        pool: &MachinePoolSpec,
    ) -> Result<()> {
        if pool.reuse && self.machine_pool_exists(handle, &pool.name).await? {
            info!(
                "MachinePool {} exists in cluster {}; reusing it",
                pool.name,
                handle.name()
            );
            return Ok(());
        }

        info!(
            "Adding machine pool {} ({} x {}) to {}",
            pool.name, pool.replicas, pool.instance_type, handle
        );
        self.ocm()
            .execute_with(|inv| {
                inv.args(["create", "machinepool", "--cluster", handle.id()])
                    .option("--instance-type", &pool.instance_type)
                    .option("--replicas", pool.replicas.to_string())
                    .arg(&pool.name)
            })
            .await?;

        self.settle_for(&pool.name, self.settle().machine_pool())
            .await;
        Ok(())
    }
}

//! Operator (ISV) installation through OLM subscriptions

use ocmqe_core::types::{OBJECT_EXISTS, OPERATOR_INSTALLED};
use ocmqe_core::CommandError;
use serde::Serialize;
use tracing::info;

use crate::error::{ClusterError, Result};
use crate::manager::ClusterManager;

/// Namespace global operators are installed into
pub const OPERATORS_NAMESPACE: &str = "openshift-operators";

/// CSV phase reported once an operator is installed
const CSV_SUCCEEDED: &str = "Succeeded";
const CSV_FAILED: &str = "Failed";

/// Phase shown while no matching CSV exists yet
const CSV_MISSING: &str = "Missing";

/// An operator to subscribe to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorSubscription {
    pub name: String,
    pub channel: String,
    pub source: String,
    pub namespace: String,
    pub source_namespace: String,
}

impl OperatorSubscription {
    pub fn new(
        name: impl Into<String>,
        channel: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            channel: channel.into(),
            source: source.into(),
            namespace: OPERATORS_NAMESPACE.to_string(),
            source_namespace: "openshift-marketplace".to_string(),
        }
    }

    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// OLM `Subscription` manifest
    pub fn manifest(&self) -> SubscriptionManifest {
        SubscriptionManifest {
            api_version: "operators.coreos.com/v1alpha1",
            kind: "Subscription",
            metadata: Metadata {
                name: self.name.clone(),
                namespace: self.namespace.clone(),
            },
            spec: SubscriptionSpec {
                channel: self.channel.clone(),
                install_plan_approval: "Automatic",
                name: self.name.clone(),
                source: self.source.clone(),
                source_namespace: self.source_namespace.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionManifest {
    pub api_version: &'static str,
    pub kind: &'static str,
    pub metadata: Metadata,
    pub spec: SubscriptionSpec,
}

#[derive(Debug, Clone, Serialize)]
pub struct Metadata {
    pub name: String,
    pub namespace: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionSpec {
    pub channel: String,
    pub install_plan_approval: &'static str,
    pub name: String,
    pub source: String,
    pub source_namespace: String,
}

/// Phase of the first CSV whose name contains `operator`
pub(crate) fn csv_phase(csv_list: &serde_json::Value, operator: &str) -> Option<String> {
    let needle = operator.to_lowercase();
    csv_list["items"].as_array()?.iter().find_map(|item| {
        let name = item["metadata"]["name"].as_str()?;
        if !name.to_lowercase().contains(&needle) {
            return None;
        }
        let phase = item["status"]["phase"].as_str().unwrap_or_default();
        Some(phase.to_string())
    })
}

impl ClusterManager {
    /// Subscribe to an operator
    pub async fn install_operator(&self, subscription: &OperatorSubscription) -> Result<()> {
        info!(
            "Subscribing to operator {} ({} from {})",
            subscription.name, subscription.channel, subscription.source
        );
        self.oc().apply(&subscription.manifest()).await?;
        Ok(())
    }

    /// Wait until the operator's CSV reaches `Succeeded`
    pub async fn wait_for_operator(&self, operator: &str, namespace: &str) -> Result<String> {
        let phase = self
            .wait_for(
                OPERATOR_INSTALLED,
                operator,
                || async move {
                    let csvs = self.oc().list_json("csv", namespace).await?;
                    let phase = csv_phase(&csvs, operator);
                    Ok::<_, CommandError>(phase.unwrap_or_else(|| CSV_MISSING.to_string()))
                },
                |phase| phase == CSV_SUCCEEDED,
                |phase| phase == CSV_FAILED,
            )
            .await?;
        info!("Operator {} is installed", operator);
        Ok(phase)
    }

    /// Subscribe to an operator and wait for it
    pub async fn install_operator_and_wait(
        &self,
        subscription: &OperatorSubscription,
    ) -> Result<()> {
        self.install_operator(subscription).await?;
        self.wait_for_operator(&subscription.name, &subscription.namespace)
            .await?;
        Ok(())
    }

    /// Check whether a cluster object exists right now
    pub async fn object_exists(&self, kind: &str, name: &str, namespace: &str) -> Result<bool> {
        Ok(self.oc().exists(kind, name, namespace).await?)
    }

    /// Wait for a cluster object to appear
    ///
    /// Lookup failures count as "not there yet" under the default
    /// `object-exists` policy; running out of attempts is `ObjectNotFound`.
    pub async fn wait_for_object(&self, kind: &str, name: &str, namespace: &str) -> Result<()> {
        let target = format!("{}/{} -n {}", kind, name, namespace);
        let result = self
            .wait_for(
                OBJECT_EXISTS,
                &target,
                || async move { self.oc().get(kind, name, namespace).await.map(|_| "found") },
                |_| true,
                |_| false,
            )
            .await;

        match result {
            Ok(_) => {
                info!("{} object called {} found", kind, name);
                Ok(())
            }
            Err(e) if e.is_wait_timeout() => {
                Err(ClusterError::object_not_found(kind, name, namespace))
            }
            Err(e) => Err(e),
        }
    }
}

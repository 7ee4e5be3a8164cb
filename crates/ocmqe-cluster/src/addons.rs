//! Product add-ons: install, uninstall and the product-specific flows

use ocmqe_core::types::{ADDON_INSTALLED, ADDON_UNINSTALLED};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{ClusterError, Result};
use crate::manager::ClusterManager;
use crate::ocm::CLUSTERS_API;
use crate::operators::{OperatorSubscription, OPERATORS_NAMESPACE};
use crate::types::{AddonState, ClusterHandle};

pub const RHODS_ADDON: &str = "managed-odh";
pub const GPU_ADDON: &str = "nvidia-gpu-addon";
pub const RHOAM_ADDON: &str = "managed-api-service";
pub const STARBURST_ADDON: &str = "managed-starburst";

/// Default CIDR range handed to the RHOAM add-on
pub const RHOAM_DEFAULT_CIDR: &str = "10.1.0.0/26";

const RHOAM_NAMESPACE: &str = "redhat-rhoam-operator";
const RHOAM_SECRETS: &[&str] = &["redhat-rhoam-deadmanssnitch", "redhat-rhoam-smtp"];

/// An add-on installation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddonInstall {
    pub addon: String,
    pub parameters: Vec<(String, String)>,
}

impl AddonInstall {
    pub fn new(addon: impl Into<String>) -> Self {
        Self {
            addon: addon.into(),
            parameters: Vec::new(),
        }
    }

    pub fn with_parameter(mut self, id: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.push((id.into(), value.into()));
        self
    }

    /// Body of `POST /clusters/<id>/addons`
    pub fn request(&self) -> AddonRequest {
        AddonRequest {
            addon: AddonRef {
                id: self.addon.clone(),
            },
            parameters: Parameters::from_pairs(&self.parameters),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AddonRequest {
    pub addon: AddonRef,
    pub parameters: Parameters,
}

#[derive(Debug, Clone, Serialize)]
pub struct AddonRef {
    pub id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Parameters {
    pub items: Vec<Parameter>,
}

impl Parameters {
    fn from_pairs(pairs: &[(String, String)]) -> Self {
        Self {
            items: pairs
                .iter()
                .map(|(id, value)| Parameter {
                    id: id.clone(),
                    value: value.clone(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Parameter {
    pub id: String,
    pub value: String,
}

/// Body of `PATCH /clusters/<id>/addons/<addon>`
#[derive(Debug, Clone, Serialize)]
pub struct AddonUpdate {
    pub parameters: Parameters,
}

/// Operators the RHODS add-on depends on, installed in this order
pub fn rhods_dependency_operators() -> Vec<OperatorSubscription> {
    vec![
        OperatorSubscription::new("authorino-operator", "tech-preview-v1", "redhat-operators"),
        OperatorSubscription::new("servicemeshoperator", "stable", "redhat-operators"),
        OperatorSubscription::new("serverless-operator", "stable", "redhat-operators"),
    ]
}

impl ClusterManager {
    pub async fn addon_state(&self, handle: &ClusterHandle, addon: &str) -> Result<AddonState> {
        Ok(self.ocm().addon_state(handle.id(), addon).await?)
    }

    pub async fn is_addon_installed(&self, handle: &ClusterHandle, addon: &str) -> Result<bool> {
        let installed = self.addon_state(handle, addon).await?.is_installed();
        info!(
            "Add-on {} is {}installed on {}",
            addon,
            if installed { "" } else { "not " },
            handle.name()
        );
        Ok(installed)
    }

    /// Request an add-on installation without waiting for it
    pub async fn install_addon(
        &self,
        handle: &ClusterHandle,
        install: &AddonInstall,
    ) -> Result<()> {
        info!("Installing add-on {} on {}", install.addon, handle);
        let path = format!("{}/{}/addons", CLUSTERS_API, handle.id());
        self.ocm().post_json(&path, &install.request()).await?;
        Ok(())
    }

    /// Request an add-on removal unless it is already not installed
    pub async fn uninstall_addon(&self, handle: &ClusterHandle, addon: &str) -> Result<()> {
        if !self.addon_state(handle, addon).await?.is_installed() {
            info!("Add-on {} is not installed on {}", addon, handle.name());
            return Ok(());
        }
        info!("Uninstalling add-on {} from {}", addon, handle);
        let path = format!("{}/{}/addons/{}", CLUSTERS_API, handle.id(), addon);
        self.ocm().delete_resource(&path).await?;
        Ok(())
    }

    pub async fn wait_for_addon_installed(
        &self,
        handle: &ClusterHandle,
        addon: &str,
    ) -> Result<AddonState> {
        self.wait_for(
            ADDON_INSTALLED,
            addon,
            || self.ocm().addon_state(handle.id(), addon),
            |state| *state == AddonState::Ready,
            |state| *state == AddonState::Failed,
        )
        .await
    }

    pub async fn wait_for_addon_uninstalled(
        &self,
        handle: &ClusterHandle,
        addon: &str,
    ) -> Result<AddonState> {
        self.wait_for(
            ADDON_UNINSTALLED,
            addon,
            || self.ocm().addon_state(handle.id(), addon),
            |state| *state == AddonState::NotInstalled,
            |_| false,
        )
        .await
    }

    /// Install RHODS with its dependency operators, then let it settle
    pub async fn install_rhods(
        &self,
        handle: &ClusterHandle,
        notification_email: &str,
    ) -> Result<()> {
        if !self.is_addon_installed(handle, RHODS_ADDON).await? {
            for operator in rhods_dependency_operators() {
                self.install_operator(&operator).await?;
                self.wait_for_operator(&operator.name, OPERATORS_NAMESPACE)
                    .await?;
            }

            let install = AddonInstall::new(RHODS_ADDON)
                .with_parameter("notification-email", notification_email);
            self.install_addon(handle, &install).await?;
            self.wait_for_addon_installed(handle, RHODS_ADDON).await?;
        }
        self.settle_for(RHODS_ADDON, self.settle().addon()).await;
        Ok(())
    }

    pub async fn uninstall_rhods(&self, handle: &ClusterHandle) -> Result<()> {
        self.uninstall_addon(handle, RHODS_ADDON).await?;
        self.wait_for_addon_uninstalled(handle, RHODS_ADDON).await?;
        Ok(())
    }

    pub async fn install_gpu_addon(&self, handle: &ClusterHandle) -> Result<()> {
        if !self.is_addon_installed(handle, GPU_ADDON).await? {
            self.install_addon(handle, &AddonInstall::new(GPU_ADDON))
                .await?;
            self.wait_for_addon_installed(handle, GPU_ADDON).await?;
        }
        self.settle_for(GPU_ADDON, self.settle().addon()).await;
        Ok(())
    }

    /// Install RHOAM and check the objects its installation must create
    ///
    /// Does not wait for the add-on to report `ready`.
    pub async fn install_rhoam(&self, handle: &ClusterHandle, cidr_range: &str) -> Result<()> {
        if self.is_addon_installed(handle, RHOAM_ADDON).await? {
            info!(
                "{} is already installed on {}",
                RHOAM_ADDON,
                handle.name()
            );
            return Ok(());
        }

        let install = AddonInstall::new(RHOAM_ADDON)
            .with_parameter("cidr-range", cidr_range);
        self.install_addon(handle, &install).await?;

        info!("Setting the useClusterStorage parameter to 'false'");
        self.wait_for_object("rhmi", "rhoam", RHOAM_NAMESPACE)
            .await?;
        self.oc()
            .merge_patch(
                "rhmi",
                "rhoam",
                RHOAM_NAMESPACE,
                &serde_json::json!({"spec": {"useClusterStorage": "false"}}),
            )
            .await?;

        for secret in RHOAM_SECRETS {
            if !self.object_exists("secret", secret, RHOAM_NAMESPACE).await? {
                warn!("{} secret was not created during installation", secret);
                return Err(ClusterError::secret_missing(*secret, RHOAM_NAMESPACE));
            }
            info!("{} secret found", secret);
        }
        Ok(())
    }

    pub async fn uninstall_rhoam(&self, handle: &ClusterHandle) -> Result<()> {
        self.uninstall_addon(handle, RHOAM_ADDON).await?;
        self.wait_for_addon_uninstalled(handle, RHOAM_ADDON).await?;
        Ok(())
    }

    /// Request the Starburst add-on; does not wait for it
    pub async fn install_starburst(
        &self,
        handle: &ClusterHandle,
        license: &str,
        notification_email: &str,
    ) -> Result<()> {
        if self.is_addon_installed(handle, STARBURST_ADDON).await? {
            info!(
                "{} is already installed on {}",
                STARBURST_ADDON,
                handle.name()
            );
            return Ok(());
        }
        let install = AddonInstall::new(STARBURST_ADDON)
            .with_parameter("notification-email", notification_email)
            .with_parameter("starburst-license", license);
        self.install_addon(handle, &install).await
    }

    pub async fn uninstall_starburst(&self, handle: &ClusterHandle) -> Result<()> {
        self.uninstall_addon(handle, STARBURST_ADDON).await?;
        self.wait_for_addon_uninstalled(handle, STARBURST_ADDON)
            .await?;
        Ok(())
    }

    /// Change the notification email of an installed add-on
    pub async fn update_notification_email(
        &self,
        handle: &ClusterHandle,
        addon: &str,
        email: &str,
    ) -> Result<String> {
        info!(
            "Updating notification email of {} on {}",
            addon,
            handle.name()
        );
        let path = format!("{}/{}/addons/{}", CLUSTERS_API, handle.id(), addon);
        let pairs = [("notification-email".to_string(), email.to_string())];
        let body = AddonUpdate {
            parameters: Parameters::from_pairs(&pairs),
        };
        self.ocm().patch_json(&path, &body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_addon_request_body() {
        let install = AddonInstall::new(RHODS_ADDON)
            .with_parameter("notification-email", "qe@example.com");
        let body = serde_json::to_value(install.request()).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "addon": {"id": "managed-odh"},
                "parameters": {"items": [{"id": "notification-email", "value": "qe@example.com"}]}
            })
        );
    }

    #[test]
    fn test_addon_without_parameters() {
        let request = AddonInstall::new(GPU_ADDON).request();
        let body = serde_json::to_value(request).unwrap();
        assert_eq!(body["parameters"]["items"], serde_json::json!([]));
    }

    #[test]
    fn test_dependency_operator_order() {
        let names: Vec<String> = rhods_dependency_operators()
            .into_iter()
            .map(|o| o.name)
            .collect();
        assert_eq!(names.len(), 3);
        assert_eq!(names[0], "authorino-operator");
        assert_eq!(names[1], "servicemeshoperator");
        assert_eq!(names[2], "serverless-operator");
    }
}

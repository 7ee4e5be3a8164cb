//! `oc` CLI client

use std::io::Write;
use std::sync::Arc;

use camino::Utf8Path;
use ocmqe_core::types::OcSettings;
use ocmqe_core::{CommandError, CommandRunner, Invocation};
use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::ocm::utf8;

/// Thin client over the `oc` CLI, logged in to the cluster under test
#[derive(Clone)]
pub struct Oc {
    runner: Arc<dyn CommandRunner>,
    settings: OcSettings,
}

impl Oc {
    pub fn new(runner: Arc<dyn CommandRunner>, settings: OcSettings) -> Self {
        Self { runner, settings }
    }

    fn command(&self) -> Invocation {
        Invocation::new(&self.settings.binary)
    }

    /// `oc apply -f <path>`
    pub async fn apply_file(&self, path: &Utf8Path) -> Result<String> {
        let inv = self.command().arg("apply").option("-f", path.as_str());
        Ok(self.runner.execute(&inv).await?.stdout)
    }

    /// Apply a typed manifest through a temporary YAML file
    pub async fn apply<T: Serialize>(&self, manifest: &T) -> Result<String> {
        let mut file = tempfile::Builder::new()
            .prefix("ocmqe-manifest-")
            .suffix(".yaml")
            .tempfile()?;
        serde_yaml_ng::to_writer(&mut file, manifest)?;
        file.flush()?;
        self.apply_file(utf8(file.path())?).await
    }

    /// `oc get <kind> <name> -n <namespace>`
    pub async fn get(
        &self,
        kind: &str,
        name: &str,
        namespace: &str,
    ) -> std::result::Result<String, CommandError> {
        let inv = self.command().args(["get", kind, name, "-n", namespace]);
        let output = self.runner.execute(&inv).await?;
        if output.stdout.contains("Error") {
            return Err(CommandError::unexpected_output(
                inv.to_string(),
                output.stdout.trim(),
            ));
        }
        Ok(output.stdout)
    }

    /// Check whether an object exists
    ///
    /// A failing `oc get` means the object is missing; only a command that
    /// could not be started is an error.
    pub async fn exists(
        &self,
        kind: &str,
        name: &str,
        namespace: &str,
    ) -> std::result::Result<bool, CommandError> {
        match self.get(kind, name, namespace).await {
            Ok(_) => Ok(true),
            Err(e @ CommandError::Spawn { .. }) => Err(e),
            Err(e) => {
                debug!("{} {} not found in {}: {}", kind, name, namespace, e);
                Ok(false)
            }
        }
    }

    /// `oc get <kind> -n <namespace> -o json`
    pub async fn list_json(
        &self,
        kind: &str,
        namespace: &str,
    ) -> std::result::Result<serde_json::Value, CommandError> {
        let inv = self
            .command()
            .args(["get", kind, "-n", namespace, "-o", "json"]);
        let stdout = self.runner.capture(&inv).await?;
        serde_json::from_str(&stdout)
            .map_err(|e| CommandError::unexpected_output(inv.to_string(), e.to_string()))
    }

    /// `oc patch <kind> <name> -n <namespace> --type=merge --patch <json>`
    pub async fn merge_patch(
        &self,
        kind: &str,
        name: &str,
        namespace: &str,
        patch: &serde_json::Value,
    ) -> Result<String> {
        let inv = self
            .command()
            .args(["patch", kind, name, "-n", namespace, "--type=merge"])
            .option("--patch", patch.to_string());
        Ok(self.runner.execute(&inv).await?.stdout)
    }

    /// `oc adm groups new <group>`
    pub async fn create_group(&self, group: &str) -> Result<()> {
        let inv = self.command().args(["adm", "groups", "new", group]);
        self.runner.execute(&inv).await?;
        Ok(())
    }

    /// `oc adm groups add-users <group> <user>`
    pub async fn add_user_to_group(&self, group: &str, user: &str) -> Result<()> {
        let inv = self
            .command()
            .args(["adm", "groups", "add-users", group, user]);
        self.runner.execute(&inv).await?;
        Ok(())
    }

    /// `oc get <users|groups>` as printed
    pub async fn list(&self, kind: &str) -> Result<String> {
        let inv = self.command().args(["get", kind]);
        Ok(self.runner.execute(&inv).await?.stdout)
    }
}

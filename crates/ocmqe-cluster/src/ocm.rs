//! `ocm` CLI client

use std::io::Write;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use ocmqe_core::types::{Environment, OcmSettings};
use ocmqe_core::{CommandError, CommandOutput, CommandRunner, Invocation};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{ClusterError, Result};
use crate::types::{AddonState, ClusterDescription, ClusterHandle, ClusterPresence, ClusterState};

/// Base path of the clusters management API
pub const CLUSTERS_API: &str = "/api/clusters_mgmt/v1/clusters";

/// Marker OCM prints when a cluster id is unknown
const CLUSTER_GONE_MARKER: &str = "Can't retrieve cluster for key";

/// Thin client over the `ocm` CLI
///
/// Every invocation carries `OCM_CONFIG` once a config file is known, and
/// create/update/delete commands carry `--v=<verbose-level>`.
#[derive(Clone)]
pub struct Ocm {
    runner: Arc<dyn CommandRunner>,
    settings: OcmSettings,
}

impl Ocm {
    pub fn new(runner: Arc<dyn CommandRunner>, settings: OcmSettings) -> Self {
        Self { runner, settings }
    }

    pub fn settings(&self) -> &OcmSettings {
        &self.settings
    }

    pub fn runner(&self) -> &Arc<dyn CommandRunner> {
        &self.runner
    }

    /// Read-only command
    fn command(&self) -> Invocation {
        let inv = Invocation::new(&self.settings.binary);
        match &self.settings.config_file {
            Some(path) => inv.env("OCM_CONFIG", path.as_str()),
            None => inv,
        }
    }

    /// Create, update or delete command
    fn mutating(&self) -> Invocation {
        self.command()
            .assign("--v", self.settings.verbose_level.to_string())
    }

    /// Log in with an offline token
    ///
    /// The login is stored in `ocm.json.<env>`, which every later
    /// invocation uses as `OCM_CONFIG`.
    pub async fn login(&mut self, token: &str, environment: Environment) -> Result<()> {
        let config_file = Utf8PathBuf::from(environment.config_file_name());
        info!("Logging in to OCM ({})", environment);

        let mut inv = Invocation::new(&self.settings.binary)
            .env("OCM_CONFIG", config_file.as_str())
            .arg("login")
            .secret_assign("--token", token);
        if environment == Environment::Stage {
            inv = inv.assign("--url", "staging");
        }
        self.runner.execute(&inv).await?;

        self.settings.environment = environment;
        self.settings.config_file = Some(config_file);
        Ok(())
    }

    /// Find the OCM id of a cluster by name, id or external id
    pub async fn resolve(&self, name: &str) -> Result<ClusterHandle> {
        let search = format!(
            "search=name = '{0}' or id = '{0}' or external_id = '{0}'",
            name
        );
        let inv = self
            .command()
            .args(["list", "clusters"])
            .option("-p", search)
            .args(["--columns", "id", "--no-headers"]);
        let output = self.runner.execute(&inv).await?;

        let id = output
            .stdout
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .ok_or_else(|| ClusterError::cluster_not_found(name))?;
        debug!("Resolved cluster {} to id {}", name, id);
        Ok(ClusterHandle::new(name, id))
    }

    fn describe_command(&self, id: &str) -> Invocation {
        self.command().args(["describe", "cluster", id, "--json"])
    }

    /// Full cluster description
    pub async fn describe(
        &self,
        id: &str,
    ) -> std::result::Result<ClusterDescription, CommandError> {
        let inv = self.describe_command(id);
        let stdout = self.runner.capture(&inv).await?;
        serde_json::from_str(&stdout)
            .map_err(|e| CommandError::unexpected_output(inv.to_string(), e.to_string()))
    }

    /// Current cluster state
    pub async fn cluster_state(&self, id: &str) -> std::result::Result<ClusterState, CommandError> {
        Ok(self.describe(id).await?.state)
    }

    /// Whether OCM still knows the cluster
    pub async fn cluster_presence(
        &self,
        id: &str,
    ) -> std::result::Result<ClusterPresence, CommandError> {
        let inv = self.describe_command(id);
        let output = self.runner.run(&inv).await?;
        if output.stdout.contains(CLUSTER_GONE_MARKER)
            || output.stderr.contains(CLUSTER_GONE_MARKER)
        {
            return Ok(ClusterPresence::Absent);
        }
        if !output.success() {
            return Err(failed(&inv, output));
        }
        Ok(ClusterPresence::Present)
    }

    /// State of one add-on on the cluster
    pub async fn addon_state(
        &self,
        id: &str,
        addon: &str,
    ) -> std::result::Result<AddonState, CommandError> {
        let inv = self
            .command()
            .args(["list", "addons", "--cluster", id, "--columns", "id,state"]);
        let output = self.runner.execute(&inv).await?;

        parse_addon_state(&output.stdout, addon).ok_or_else(|| {
            CommandError::unexpected_output(inv.to_string(), format!("add-on {} not listed", addon))
        })
    }

    /// Versions offered by OCM, in listing order
    pub async fn list_versions(
        &self,
        channel_group: Option<&str>,
    ) -> std::result::Result<Vec<String>, CommandError> {
        let mut inv = self.command().args(["list", "versions"]);
        if let Some(group) = channel_group {
            inv = inv.option("--channel-group", group);
        }
        let output = self.runner.execute(&inv).await?;
        Ok(output
            .stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Run a mutating verb such as `hibernate cluster <id>`
    pub async fn run_verb<I, A>(&self, args: I) -> Result<CommandOutput>
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        Ok(self.runner.execute(&self.mutating().args(args)).await?)
    }

    /// Run a mutating command built by the caller on top of `ocm --v=N`
    pub async fn execute_with<F>(&self, build: F) -> Result<CommandOutput>
    where
        F: FnOnce(Invocation) -> Invocation,
    {
        Ok(self.runner.execute(&build(self.mutating())).await?)
    }

    /// Run a read-only command built by the caller
    pub async fn query_with<F>(&self, build: F) -> Result<CommandOutput>
    where
        F: FnOnce(Invocation) -> Invocation,
    {
        Ok(self.runner.execute(&build(self.command())).await?)
    }

    /// `ocm post <path> --body=<file>`
    pub async fn post_file(&self, path: &str, body: &Utf8Path) -> Result<String> {
        let inv = self
            .mutating()
            .args(["post", path])
            .assign("--body", body.as_str());
        Ok(self.runner.execute(&inv).await?.stdout)
    }

    /// `ocm patch <path> --body=<file>`
    pub async fn patch_file(&self, path: &str, body: &Utf8Path) -> Result<String> {
        let inv = self
            .mutating()
            .args(["patch", path])
            .assign("--body", body.as_str());
        Ok(self.runner.execute(&inv).await?.stdout)
    }

    /// POST a typed body through a temporary file
    pub async fn post_json<T: Serialize>(&self, path: &str, body: &T) -> Result<String> {
        let file = write_body(body)?;
        self.post_file(path, utf8(file.path())?).await
    }

    /// PATCH a typed body through a temporary file
    pub async fn patch_json<T: Serialize>(&self, path: &str, body: &T) -> Result<String> {
        let file = write_body(body)?;
        self.patch_file(path, utf8(file.path())?).await
    }

    /// `ocm delete <path>`
    pub async fn delete_resource(&self, path: &str) -> Result<String> {
        let inv = self.mutating().args(["delete", path]);
        Ok(self.runner.execute(&inv).await?.stdout)
    }
}

fn failed(inv: &Invocation, output: CommandOutput) -> CommandError {
    CommandError::Failed {
        command: inv.to_string(),
        status: match output.code {
            Some(code) => format!("exit code {}", code),
            None => "terminated by signal".to_string(),
        },
        code: output.code,
        stderr: output.stderr.trim().to_string(),
    }
}

/// Find `addon` in `ocm list addons --columns id,state` output
pub(crate) fn parse_addon_state(listing: &str, addon: &str) -> Option<AddonState> {
    listing.lines().find_map(|line| {
        let line = line.trim();
        let rest = line.strip_prefix(addon)?;
        if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
            return None;
        }
        rest.trim().parse().ok()
    })
}

pub(crate) fn write_body<T: Serialize>(body: &T) -> Result<tempfile::NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix("ocmqe-body-")
        .suffix(".json")
        .tempfile()?;
    serde_json::to_writer_pretty(&mut file, body)?;
    file.flush()?;
    Ok(file)
}

pub(crate) fn utf8(path: &std::path::Path) -> Result<&Utf8Path> {
    Utf8Path::from_path(path).ok_or_else(|| {
        ClusterError::invalid_document(path.display().to_string(), "path is not valid UTF-8")
    })
}

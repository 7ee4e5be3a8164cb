//! ocm CLI installation
//!
//! Downloads the pinned `ocm` release binary when the CLI is not already
//! usable.
//!
//! # Example
//!
//! ```ignore
//! use ocmqe_cluster::installer;
//!
//! let runner = ocmqe_core::SystemRunner::new();
//! let install_path = Utf8Path::new(installer::DEFAULT_INSTALL_PATH);
//! installer::install_ocm_cli(&runner, &settings, install_path).await?;
//! ```

use std::io::Write;

use camino::Utf8Path;
use ocmqe_core::types::OcmSettings;
use ocmqe_core::{CommandRunner, Invocation};
use tracing::{debug, info, warn};

use crate::error::{ClusterError, Result};

/// Default install location of the ocm binary
pub const DEFAULT_INSTALL_PATH: &str = "/usr/local/bin/ocm";

/// Check if `ocm version` runs
pub async fn is_ocm_cli_installed(runner: &dyn CommandRunner, settings: &OcmSettings) -> bool {
    let inv = Invocation::new(&settings.binary).arg("version");
    match runner.run(&inv).await {
        Ok(output) if output.success() => {
            debug!("ocm version: {}", output.stdout.trim());
            true
        }
        _ => false,
    }
}

/// Install the ocm CLI unless it is already available
///
/// Returns `true` when a binary was installed.
pub async fn install_ocm_cli(
    runner: &dyn CommandRunner,
    settings: &OcmSettings,
    install_path: &Utf8Path,
) -> Result<bool> {
    if is_ocm_cli_installed(runner, settings).await {
        info!("ocm cli already installed");
        return Ok(false);
    }

    info!("Installing ocm cli from {}", settings.cli_url);
    let bytes = download(&settings.cli_url).await?;

    let install_dir = install_path.parent().unwrap_or(Utf8Path::new("."));
    if is_writable(install_dir) {
        let mut file = tempfile::NamedTempFile::new_in(install_dir)?;
        file.write_all(&bytes)?;
        make_executable(file.path())?;
        file.persist(install_path).map_err(|e| e.error)?;
    } else {
        info!("Installation requires sudo access...");
        sudo_install(runner, &bytes, install_path).await?;
    }

    info!("ocm installed to {}", install_path);
    Ok(true)
}

/// Stage the binary in the system temp dir and `sudo mv` it into place
async fn sudo_install(
    runner: &dyn CommandRunner,
    bytes: &[u8],
    install_path: &Utf8Path,
) -> Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    file.write_all(bytes)?;
    make_executable(file.path())?;
    let (_, temp_path) = file.keep().map_err(|e| e.error)?;

    let inv = Invocation::new("sudo").args([
        "mv".to_string(),
        temp_path.to_string_lossy().into_owned(),
        install_path.to_string(),
    ]);
    if let Err(e) = runner.execute(&inv).await {
        if let Err(remove) = std::fs::remove_file(&temp_path) {
            warn!("Failed to remove {}: {}", temp_path.display(), remove);
        }
        return Err(e.into());
    }
    Ok(())
}

async fn download(url: &str) -> Result<Vec<u8>> {
    debug!("Downloading from: {}", url);
    let response = reqwest::get(url).await?;

    if !response.status().is_success() {
        return Err(ClusterError::Download {
            url: url.to_string(),
            status: response.status().as_u16(),
        });
    }

    Ok(response.bytes().await?.to_vec())
}

fn is_writable(dir: &Utf8Path) -> bool {
    tempfile::NamedTempFile::new_in(dir).is_ok()
}

fn make_executable(path: &std::path::Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

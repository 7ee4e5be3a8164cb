//! Candidate version tracking
//!
//! The ledger is a JSON file recording the newest candidate version of each
//! `major.minor` stream, plus a `RUN` list of versions that changed since the
//! last refresh and still need a test run:
//!
//! ```json
//! { "4": { "4.14": "4.14.12", "4.15": "4.15.0-rc.3" }, "RUN": ["4.14.12"] }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::ops::Range;

use camino::Utf8Path;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::create::CANDIDATE_CHANNEL_GROUP;
use crate::error::Result;
use crate::manager::ClusterManager;

const CANDIDATE_SUFFIX: &str = "-candidate";

/// Latest version per `major.minor` stream
pub type StreamVersions = BTreeMap<String, String>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionLedger {
    #[serde(flatten)]
    pub majors: BTreeMap<String, StreamVersions>,

    #[serde(rename = "RUN", default)]
    pub run: Option<Vec<String>>,
}

impl VersionLedger {
    /// Load the ledger; a missing or empty file is an empty ledger
    pub fn load(path: &Utf8Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(content) if content.trim().is_empty() => Ok(Self::default()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, path: &Utf8Path) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Record the latest versions of `major` and update `RUN`
    ///
    /// Versions that are new or differ from the recorded ones go into `RUN`,
    /// replacing it when `new_run` is set and joining it otherwise. Returns
    /// the changed versions.
    pub fn record(&mut self, major: &str, latest: StreamVersions, new_run: bool) -> Vec<String> {
        let previous = self.majors.get(major);
        let changed: Vec<String> = latest
            .iter()
            .filter(|(stream, version)| previous.and_then(|p| p.get(*stream)) != Some(*version))
            .map(|(_, version)| version.clone())
            .collect();

        if !latest.is_empty() {
            self.majors.insert(major.to_string(), latest);
        }

        let run = if new_run {
            changed.clone()
        } else {
            let mut merged: BTreeSet<String> =
                self.run.take().unwrap_or_default().into_iter().collect();
            merged.extend(changed.iter().cloned());
            merged.into_iter().collect()
        };
        self.run = Some(run);
        changed
    }
}

/// Newest version of `major.minor` in an `ocm list versions` listing
pub fn latest_in_stream(versions: &[String], major: u32, minor: u32) -> Option<String> {
    let prefix = format!("{}.{}.", major, minor);
    versions
        .iter()
        .filter(|v| v.starts_with(&prefix))
        .next_back()
        .map(|v| v.strip_suffix(CANDIDATE_SUFFIX).unwrap_or(v).to_string())
}

impl ClusterManager {
    /// Newest candidate version of `major.minor`, if OCM offers one
    pub async fn latest_candidate_version(&self, major: u32, minor: u32) -> Result<Option<String>> {
        let versions = self
            .ocm()
            .list_versions(Some(CANDIDATE_CHANNEL_GROUP))
            .await?;
        Ok(latest_in_stream(&versions, major, minor))
    }

    /// Newest candidate version of each minor stream in `minors`
    pub async fn candidate_versions(
        &self,
        major: u32,
        minors: Range<u32>,
    ) -> Result<StreamVersions> {
        let versions = self
            .ocm()
            .list_versions(Some(CANDIDATE_CHANNEL_GROUP))
            .await?;
        Ok(minors
            .filter_map(|minor| {
                latest_in_stream(&versions, major, minor)
                    .map(|v| (format!("{}.{}", major, minor), v))
            })
            .collect())
    }

    /// Refresh the ledger at `path` and return its `RUN` list
    pub async fn refresh_version_ledger(
        &self,
        path: &Utf8Path,
        major: u32,
        minors: Range<u32>,
        new_run: bool,
    ) -> Result<Vec<String>> {
        let latest = self.candidate_versions(major, minors).await?;
        let mut ledger = VersionLedger::load(path)?;
        let changed = ledger.record(&major.to_string(), latest, new_run);
        ledger.save(path)?;

        if changed.is_empty() {
            info!("All candidate versions in {} are up to date", path);
        } else {
            info!("New candidate versions: {}", changed.join(", "));
        }
        Ok(ledger.run.unwrap_or_default())
    }
}

//! Channel group changes and scheduled upgrades

use std::fs;

use camino::Utf8Path;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use tracing::info;

use crate::error::{ClusterError, Result};
use crate::manager::ClusterManager;
use crate::ocm::CLUSTERS_API;
use crate::types::ClusterHandle;

/// How far ahead an upgrade is scheduled
const UPGRADE_LEAD_MINUTES: i64 = 7;

/// Placeholder resolved to the newest available upgrade
const LATEST: &str = "latest";

/// UTC timestamp format OCM expects for `next_run`
pub fn next_run(now: DateTime<Utc>) -> String {
    (now + Duration::minutes(UPGRADE_LEAD_MINUTES))
        .format("%Y-%m-%dT%H:%M:%SZ")
        .to_string()
}

/// Fill in `next_run` and resolve `version: latest` in an upgrade policy
pub fn prepare_upgrade_policy(
    policy: &mut Value,
    now: DateTime<Utc>,
    cluster: &str,
    available_upgrades: &[String],
) -> Result<()> {
    let object = policy.as_object_mut().ok_or_else(|| {
        ClusterError::invalid_document("upgrade policy", "expected a JSON object")
    })?;
    object.insert("next_run".to_string(), Value::String(next_run(now)));

    if object.get("version").and_then(Value::as_str) == Some(LATEST) {
        let latest = available_upgrades
            .last()
            .ok_or_else(|| ClusterError::NoAvailableUpgrade {
                cluster: cluster.to_string(),
            })?;
        info!(
            "Versions available to upgrade to: {}",
            available_upgrades.join(", ")
        );
        object.insert("version".to_string(), Value::String(latest.clone()));
    }
    Ok(())
}

impl ClusterManager {
    /// Move the cluster to the channel group described in `body`
    pub async fn change_channel_group(
        &self,
        handle: &ClusterHandle,
        body: &Utf8Path,
    ) -> Result<String> {
        info!(
            "Updating the channel group of {} from {}",
            handle.name(),
            body
        );
        let path = format!("{}/{}", CLUSTERS_API, handle.id());
        self.ocm().patch_file(&path, body).await
    }

    /// Schedule an upgrade seven minutes from now
    ///
    /// The policy file is rewritten with the resolved `next_run` and
    /// version before it is posted.
    pub async fn schedule_upgrade(
        &self,
        handle: &ClusterHandle,
        policy_path: &Utf8Path,
    ) -> Result<String> {
        let mut policy: Value = serde_json::from_str(&fs::read_to_string(policy_path)?)?;

        let wants_latest = policy.get("version").and_then(Value::as_str) == Some(LATEST);
        let upgrades = if wants_latest {
            self.ocm()
                .describe(handle.id())
                .await?
                .version
                .available_upgrades
        } else {
            Vec::new()
        };

        prepare_upgrade_policy(&mut policy, Utc::now(), handle.name(), &upgrades)?;
        fs::write(policy_path, serde_json::to_string_pretty(&policy)?)?;

        info!(
            "Scheduling upgrade of {} to {} at {}",
            handle.name(),
            policy["version"],
            policy["next_run"]
        );
        let path = format!("{}/{}/upgrade_policies", CLUSTERS_API, handle.id());
        self.ocm().post_file(&path, policy_path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 23, 55, 30).unwrap()
    }

    #[test]
    fn test_next_run_crosses_midnight() {
        assert_eq!(next_run(now()), "2024-03-02T00:02:30Z");
    }

    #[test]
    fn test_prepare_resolves_latest() {
        let mut policy = serde_json::json!({"schedule_type": "manual", "version": "latest"});
        let upgrades = vec!["4.14.13".to_string(), "4.15.2".to_string()];
        prepare_upgrade_policy(&mut policy, now(), "qe", &upgrades).unwrap();
        assert_eq!(policy["version"], "4.15.2");
        assert_eq!(policy["next_run"], "2024-03-02T00:02:30Z");
        assert_eq!(policy["schedule_type"], "manual");
    }

    #[test]
    fn test_prepare_keeps_explicit_version() {
        let mut policy = serde_json::json!({"version": "4.14.13"});
        prepare_upgrade_policy(&mut policy, now(), "qe", &[]).unwrap();
        assert_eq!(policy["version"], "4.14.13");
    }

    #[test]
    fn test_prepare_latest_without_upgrades() {
        let mut policy = serde_json::json!({"version": "latest"});
        assert!(matches!(
            prepare_upgrade_policy(&mut policy, now(), "qe", &[]),
            Err(ClusterError::NoAvailableUpgrade { .. })
        ));
    }
}

//! Cluster manager: the entry point for every lifecycle operation

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use ocmqe_core::poll::TracingObserver;
use ocmqe_core::types::{Environment, PollPoliciesConfig, SettleConfig};
use ocmqe_core::{CommandError, CommandRunner, HarnessConfig, Poller};
use tracing::info;

use crate::error::{ClusterError, Result};
use crate::oc::Oc;
use crate::ocm::Ocm;
use crate::types::ClusterHandle;

/// Drives clusters, add-ons, operators and identity through `ocm` and `oc`
///
/// Cheap to clone; clones share the command runner.
#[derive(Clone)]
pub struct ClusterManager {
    ocm: Ocm,
    oc: Oc,
    polling: PollPoliciesConfig,
    settle: SettleConfig,
}

impl ClusterManager {
    pub fn new(runner: Arc<dyn CommandRunner>, config: HarnessConfig) -> Self {
        Self {
            ocm: Ocm::new(Arc::clone(&runner), config.ocm),
            oc: Oc::new(runner, config.oc),
            polling: config.polling,
            settle: config.settle,
        }
    }

    pub fn ocm(&self) -> &Ocm {
        &self.ocm
    }

    pub fn oc(&self) -> &Oc {
        &self.oc
    }

    pub fn polling(&self) -> &PollPoliciesConfig {
        &self.polling
    }

    pub fn settle(&self) -> &SettleConfig {
        &self.settle
    }

    /// Log in to OCM; later commands use the resulting `OCM_CONFIG`
    pub async fn login(&mut self, token: &str, environment: Environment) -> Result<()> {
        self.ocm.login(token, environment).await
    }

    /// Resolve a cluster name, id or external id
    pub async fn resolve(&self, name: &str) -> Result<ClusterHandle> {
        self.ocm.resolve(name).await
    }

    /// Poll with the policy configured for `operation`
    pub(crate) async fn wait_for<S, F, Fut, C, T>(
        &self,
        operation: &'static str,
        target: &str,
        probe: F,
        is_converged: C,
        is_terminal: T,
    ) -> Result<S>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<S, CommandError>>,
        C: Fn(&S) -> bool,
        T: Fn(&S) -> bool,
        S: fmt::Debug + fmt::Display,
    {
        let policy = self.polling.for_operation(operation).clone();
        info!(
            "Waiting for {} on {} (every {}s, up to {}s)",
            operation, target, policy.interval_secs, policy.timeout_secs
        );

        let poller = Poller::new(policy)?
            .with_observer(TracingObserver::new(format!("{} {}", operation, target)));
        poller
            .poll(probe, is_converged, is_terminal)
            .await
            .into_result()
            .map_err(|source| ClusterError::Wait {
                operation,
                target: target.to_string(),
                source: source.map_state(|s| s.to_string()),
            })
    }

    /// Give services time to start after a step converged
    pub(crate) async fn settle_for(&self, what: &str, delay: Duration) {
        if delay.is_zero() {
            return;
        }
        info!("Waiting {}s for {} to settle", delay.as_secs(), what);
        tokio::time::sleep(delay).await;
    }
}

//! Poll-until-converged execution
//!
//! Elapsed time is accounted as the sum of the intervals slept, so a slow
//! probe never shortens the number of probes a policy allows.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::error::Result;
use crate::types::{PollPolicy, ProbeErrorPolicy};

use super::observer::{NoOpObserver, PollObserver};
use super::outcome::{PollOutcome, TerminalFailure};

/// Poll with a policy until the state converges
///
/// Convenience wrapper for waits without a terminal-failure predicate and
/// without observation. Fails only when the policy is invalid.
///
/// # Example
///
/// ```rust,no_run
/// use ocmqe_core::poll::poll_until;
/// use ocmqe_core::types::PollPolicy;
///
/// async fn example() -> ocmqe_core::Result<()> {
///     let outcome = poll_until(
///         &PollPolicy::new(60, 3600),
///         || async { Ok::<_, std::io::Error>("not installed".to_string()) },
///         |state| state == "not installed",
///     )
///     .await?;
///     assert!(outcome.is_converged());
///     Ok(())
/// }
/// ```
pub async fn poll_until<S, E, F, Fut, C>(
    policy: &PollPolicy,
    probe: F,
    is_converged: C,
) -> Result<PollOutcome<S, E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<S, E>>,
    C: Fn(&S) -> bool,
    S: fmt::Debug,
    E: fmt::Display,
{
    let poller = Poller::new(policy.clone())?;
    Ok(poller.poll(probe, is_converged, |_| false).await)
}

/// A condition poller bound to one policy and observer
///
/// A poller holds no state between sessions; the same instance can run any
/// number of sequential sessions.
#[derive(Debug, Clone)]
pub struct Poller<O = NoOpObserver> {
    policy: PollPolicy,
    observer: O,
}

impl Poller<NoOpObserver> {
    /// Create a poller, rejecting policies with a zero interval
    pub fn new(policy: PollPolicy) -> Result<Self> {
        policy.validate()?;
        Ok(Self {
            policy,
            observer: NoOpObserver,
        })
    }
}

impl<O> Poller<O> {
    /// Set the observer
    pub fn with_observer<O2>(self, observer: O2) -> Poller<O2> {
        Poller {
            policy: self.policy,
            observer,
        }
    }

    /// Get the policy
    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }
}

impl<O: PollObserver> Poller<O> {
    /// Poll until converged, with no terminal states
    pub async fn poll_until<S, E, F, Fut, C>(&self, probe: F, is_converged: C) -> PollOutcome<S, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<S, E>>,
        C: Fn(&S) -> bool,
        S: fmt::Debug,
        E: fmt::Display,
    {
        self.poll(probe, is_converged, |_| false).await
    }

    /// Run one polling session
    ///
    /// # Arguments
    ///
    /// * `probe` - Queries the external system; `Err` means the query itself failed
    /// * `is_converged` - True when the target state is reached
    /// * `is_terminal_failure` - True for states that retrying cannot fix
    ///
    /// Terminal states are checked before convergence. The first probe always
    /// runs, even with a zero timeout.
    pub async fn poll<S, E, F, Fut, C, T>(
        &self,
        mut probe: F,
        is_converged: C,
        is_terminal_failure: T,
    ) -> PollOutcome<S, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<S, E>>,
        C: Fn(&S) -> bool,
        T: Fn(&S) -> bool,
        S: fmt::Debug,
        E: fmt::Display,
    {
        let interval = self.policy.interval();
        let timeout = self.policy.timeout();
        let started = Instant::now();
        let mut elapsed = Duration::ZERO;
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            self.observer.on_probe(attempt, elapsed);

            match probe().await {
                Err(err) => match self.policy.on_probe_error {
                    ProbeErrorPolicy::Abort => {
                        self.observer.on_probe_failed(attempt, &err, false);
                        return PollOutcome::TerminalFailure(TerminalFailure::Probe(err));
                    }
                    ProbeErrorPolicy::Continue => {
                        self.observer.on_probe_failed(attempt, &err, true);
                    }
                },
                Ok(state) => {
                    if is_terminal_failure(&state) {
                        self.observer.on_terminal_state(attempt, &state);
                        return PollOutcome::TerminalFailure(TerminalFailure::State(state));
                    }
                    if is_converged(&state) {
                        self.observer.on_converged(attempt, started.elapsed());
                        return PollOutcome::Converged(state);
                    }
                    self.observer.on_pending(attempt, &state, interval);
                }
            }

            tokio::time::sleep(interval).await;
            elapsed += interval;

            // An interval that covers the whole budget leaves room for one probe only
            if interval >= timeout || elapsed > timeout {
                self.observer.on_timed_out(attempt, elapsed);
                return PollOutcome::TimedOut {
                    attempts: attempt,
                    elapsed,
                };
            }
        }
    }
}

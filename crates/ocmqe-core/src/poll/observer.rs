//! Polling session observation and logging
//!
//! This module provides the `PollObserver` trait for monitoring polling
//! sessions and a `TracingObserver` implementation that logs using the
//! `tracing` crate.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

/// Observer trait for polling session events
///
/// States are passed as `Debug` and probe errors as `Display` so observers
/// work with any state and error type.
pub trait PollObserver: Send + Sync {
    /// Called before each probe
    ///
    /// # Arguments
    ///
    /// * `attempt` - The probe number (1-indexed)
    /// * `elapsed` - Accounted time so far
    fn on_probe(&self, attempt: u32, elapsed: Duration);

    /// Called when a probe returned a non-terminal, non-converged state
    fn on_pending(&self, attempt: u32, state: &dyn fmt::Debug, next_delay: Duration);

    /// Called when the probe itself failed
    ///
    /// `will_retry` is false when the failure ends the session.
    fn on_probe_failed(&self, attempt: u32, error: &dyn fmt::Display, will_retry: bool);

    /// Called when the target state was reached
    fn on_converged(&self, attempt: u32, total_duration: Duration);

    /// Called when a terminal state ended the session
    fn on_terminal_state(&self, attempt: u32, state: &dyn fmt::Debug);

    /// Called when the budget ran out
    fn on_timed_out(&self, attempts: u32, elapsed: Duration);
}

/// A no-op observer that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpObserver;

impl PollObserver for NoOpObserver {
    fn on_probe(&self, _attempt: u32, _elapsed: Duration) {}

    fn on_pending(&self, _attempt: u32, _state: &dyn fmt::Debug, _next_delay: Duration) {}

    fn on_probe_failed(&self, _attempt: u32, _error: &dyn fmt::Display, _will_retry: bool) {}

    fn on_converged(&self, _attempt: u32, _total_duration: Duration) {}

    fn on_terminal_state(&self, _attempt: u32, _state: &dyn fmt::Debug) {}

    fn on_timed_out(&self, _attempts: u32, _elapsed: Duration) {}
}

/// An observer that logs polling events using the `tracing` crate
///
/// # Log Levels
///
/// - `on_probe`: DEBUG
/// - `on_pending`: INFO
/// - `on_probe_failed`: WARN when polling continues, ERROR otherwise
/// - `on_converged`: INFO
/// - `on_terminal_state`: ERROR
/// - `on_timed_out`: ERROR
#[derive(Debug, Clone)]
pub struct TracingObserver {
    /// Name of the wait (for log context)
    operation: String,
}

impl TracingObserver {
    /// Create a new tracing observer
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
        }
    }

    /// Get the operation name
    pub fn operation(&self) -> &str {
        &self.operation
    }
}

impl Default for TracingObserver {
    fn default() -> Self {
        Self::new("poll")
    }
}

impl PollObserver for TracingObserver {
    fn on_probe(&self, attempt: u32, elapsed: Duration) {
        tracing::debug!(
            operation = %self.operation,
            attempt = attempt,
            elapsed_secs = elapsed.as_secs(),
            "probing"
        );
    }

    fn on_pending(&self, attempt: u32, state: &dyn fmt::Debug, next_delay: Duration) {
        tracing::info!(
            operation = %self.operation,
            attempt = attempt,
            state = ?state,
            delay_secs = next_delay.as_secs(),
            "not there yet, waiting"
        );
    }

    fn on_probe_failed(&self, attempt: u32, error: &dyn fmt::Display, will_retry: bool) {
        if will_retry {
            tracing::warn!(
                operation = %self.operation,
                attempt = attempt,
                error = %error,
                "probe failed, will poll again"
            );
        } else {
            tracing::error!(
                operation = %self.operation,
                attempt = attempt,
                error = %error,
                "probe failed, giving up"
            );
        }
    }

    fn on_converged(&self, attempt: u32, total_duration: Duration) {
        tracing::info!(
            operation = %self.operation,
            attempt = attempt,
            total_duration_ms = total_duration.as_millis() as u64,
            "converged"
        );
    }

    fn on_terminal_state(&self, attempt: u32, state: &dyn fmt::Debug) {
        tracing::error!(
            operation = %self.operation,
            attempt = attempt,
            state = ?state,
            "terminal state reached"
        );
    }

    fn on_timed_out(&self, attempts: u32, elapsed: Duration) {
        tracing::error!(
            operation = %self.operation,
            attempts = attempts,
            elapsed_secs = elapsed.as_secs(),
            "timed out waiting"
        );
    }
}

/// An observer that counts polling events
///
/// Useful for testing.
#[derive(Debug, Default)]
pub struct StatsObserver {
    pub probes: AtomicU32,
    pub pending: AtomicU32,
    pub probe_failures: AtomicU32,
    pub converged: AtomicU32,
    pub terminal: AtomicU32,
    pub timeouts: AtomicU32,
}

impl StatsObserver {
    /// Create a new stats observer
    pub fn new() -> Self {
        Self::default()
    }

    pub fn probes(&self) -> u32 {
        self.probes.load(Ordering::SeqCst)
    }

    pub fn pending(&self) -> u32 {
        self.pending.load(Ordering::SeqCst)
    }

    pub fn probe_failures(&self) -> u32 {
        self.probe_failures.load(Ordering::SeqCst)
    }

    pub fn converged(&self) -> u32 {
        self.converged.load(Ordering::SeqCst)
    }

    pub fn terminal(&self) -> u32 {
        self.terminal.load(Ordering::SeqCst)
    }

    pub fn timeouts(&self) -> u32 {
        self.timeouts.load(Ordering::SeqCst)
    }
}

impl PollObserver for StatsObserver {
    fn on_probe(&self, _attempt: u32, _elapsed: Duration) {
        self.probes.fetch_add(1, Ordering::SeqCst);
    }

    fn on_pending(&self, _attempt: u32, _state: &dyn fmt::Debug, _next_delay: Duration) {
        self.pending.fetch_add(1, Ordering::SeqCst);
    }

    fn on_probe_failed(&self, _attempt: u32, _error: &dyn fmt::Display, _will_retry: bool) {
        self.probe_failures.fetch_add(1, Ordering::SeqCst);
    }

    fn on_converged(&self, _attempt: u32, _total_duration: Duration) {
        self.converged.fetch_add(1, Ordering::SeqCst);
    }

    fn on_terminal_state(&self, _attempt: u32, _state: &dyn fmt::Debug) {
        self.terminal.fetch_add(1, Ordering::SeqCst);
    }

    fn on_timed_out(&self, _attempts: u32, _elapsed: Duration) {
        self.timeouts.fetch_add(1, Ordering::SeqCst);
    }
}

impl<T: PollObserver + ?Sized> PollObserver for std::sync::Arc<T> {
    fn on_probe(&self, attempt: u32, elapsed: Duration) {
        (**self).on_probe(attempt, elapsed)
    }

    fn on_pending(&self, attempt: u32, state: &dyn fmt::Debug, next_delay: Duration) {
        (**self).on_pending(attempt, state, next_delay)
    }

    fn on_probe_failed(&self, attempt: u32, error: &dyn fmt::Display, will_retry: bool) {
        (**self).on_probe_failed(attempt, error, will_retry)
    }

    fn on_converged(&self, attempt: u32, total_duration: Duration) {
        (**self).on_converged(attempt, total_duration)
    }

    fn on_terminal_state(&self, attempt: u32, state: &dyn fmt::Debug) {
        (**self).on_terminal_state(attempt, state)
    }

    fn on_timed_out(&self, attempts: u32, elapsed: Duration) {
        (**self).on_timed_out(attempts, elapsed)
    }
}

impl<T: PollObserver + ?Sized> PollObserver for Box<T> {
    fn on_probe(&self, attempt: u32, elapsed: Duration) {
        (**self).on_probe(attempt, elapsed)
    }

    fn on_pending(&self, attempt: u32, state: &dyn fmt::Debug, next_delay: Duration) {
        (**self).on_pending(attempt, state, next_delay)
    }

    fn on_probe_failed(&self, attempt: u32, error: &dyn fmt::Display, will_retry: bool) {
        (**self).on_probe_failed(attempt, error, will_retry)
    }

    fn on_converged(&self, attempt: u32, total_duration: Duration) {
        (**self).on_converged(attempt, total_duration)
    }

    fn on_terminal_state(&self, attempt: u32, state: &dyn fmt::Debug) {
        (**self).on_terminal_state(attempt, state)
    }

    fn on_timed_out(&self, attempts: u32, elapsed: Duration) {
        (**self).on_timed_out(attempts, elapsed)
    }
}

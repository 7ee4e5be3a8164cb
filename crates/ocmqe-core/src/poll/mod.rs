//! Condition poller
//!
//! Every lifecycle wait in the harness has the same shape: ask an external
//! system for a state, compare it against a target, sleep, repeat until the
//! target is reached, a terminal state shows up, or the budget runs out.
//! This module implements that loop once.
//!
//! # Features
//!
//! - Three-way outcome: converged, timed out, terminal failure
//! - Optional terminal-failure predicate (e.g. cluster state `error`)
//! - Configurable probe error policy: abort or keep polling
//! - Observable sessions via the `PollObserver` trait
//! - Built-in `TracingObserver` for logging
//!
//! # Example
//!
//! ```rust,no_run
//! use ocmqe_core::poll::{Poller, TracingObserver};
//! use ocmqe_core::types::PollPolicy;
//!
//! async fn example() -> ocmqe_core::Result<()> {
//!     let poller = Poller::new(PollPolicy::new(60, 3600))?
//!         .with_observer(TracingObserver::new("cluster-ready"));
//!
//!     let outcome = poller
//!         .poll(
//!             || async { Ok::<_, std::io::Error>("ready".to_string()) },
//!             |state| state == "ready",
//!             |state| state == "error",
//!         )
//!         .await;
//!
//!     assert!(outcome.is_converged());
//!     Ok(())
//! }
//! ```

mod observer;
mod outcome;
mod poller;

pub use observer::{NoOpObserver, PollObserver, StatsObserver, TracingObserver};
pub use outcome::{PollError, PollOutcome, TerminalFailure};
pub use poller::{poll_until, Poller};

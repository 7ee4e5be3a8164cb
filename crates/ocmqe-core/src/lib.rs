//! # ocmqe-core
//!
//! Core library for the ocmqe harness providing:
//! - The condition poller used by every lifecycle wait
//! - A command execution facility for the `ocm` and `oc` CLIs
//! - Harness configuration (ocmqe.yaml) with per-operation poll policies
//! - Tracing subscriber setup

pub mod command;
pub mod config;
pub mod error;
pub mod logging;
pub mod poll;
pub mod types;

pub use command::{CommandError, CommandOutput, CommandRunner, Invocation, SystemRunner};
pub use config::HarnessConfig;
pub use error::{Error, Result};
pub use poll::{PollError, PollOutcome, Poller, TerminalFailure};
pub use types::{PollPoliciesConfig, PollPolicy, ProbeErrorPolicy};

//! Command execution facility
//!
//! All interaction with `ocm` and `oc` goes through a [`CommandRunner`]. An
//! [`Invocation`] describes the command as a program plus ordered arguments,
//! so nothing is ever assembled by string concatenation or passed through a
//! shell.

mod error;
mod invocation;
mod runner;

pub use error::CommandError;
pub use invocation::Invocation;
pub use runner::{command_exists, CommandOutput, CommandRunner, SystemRunner};

//! Tracing subscriber setup for harness entry points

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::{Error, Result};

/// Build the level filter for a verbosity count
///
/// Info is the default so lifecycle progress is visible; `quiet` wins over
/// any verbosity.
pub fn level_filter(verbose: u8, quiet: bool) -> EnvFilter {
    if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    }
}

/// Install the global tracing subscriber
///
/// Returns an error if a global subscriber is already installed, so test
/// suites can call this from several places and ignore the second failure.
pub fn init_tracing(verbose: u8, quiet: bool) -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(level_filter(verbose, quiet))
        .try_init()
        .map_err(|e| Error::Logging {
            message: e.to_string(),
        })
}

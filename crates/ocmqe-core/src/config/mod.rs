//! Harness configuration

mod loader;

pub use loader::{HarnessConfig, CONFIG_FILE_NAMES};

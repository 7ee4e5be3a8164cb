//! Error types for ocmqe-core

use thiserror::Error;

/// Result type alias using ocmqe-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for the harness
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Invalid configuration format
    #[error("Invalid configuration format: {message}")]
    InvalidConfig { message: String },

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Poll policy that cannot drive a polling session
    #[error("Invalid poll policy: {message}")]
    InvalidPollPolicy { message: String },

    /// Unknown testing environment
    #[error("Unknown environment: {environment}. Valid environments: prod, stage")]
    InvalidEnvironment { environment: String },

    /// Tracing subscriber could not be installed
    #[error("Failed to initialize logging: {message}")]
    Logging { message: String },
}

impl Error {
    /// Create a config not found error
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    /// Create an invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an invalid poll policy error
    pub fn invalid_poll_policy(message: impl Into<String>) -> Self {
        Self::InvalidPollPolicy {
            message: message.into(),
        }
    }

    /// Create an invalid environment error
    pub fn invalid_environment(environment: impl Into<String>) -> Self {
        Self::InvalidEnvironment {
            environment: environment.into(),
        }
    }
}

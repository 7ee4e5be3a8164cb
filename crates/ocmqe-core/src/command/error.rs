//! Errors from running external commands

use thiserror::Error;

/// A command could not be run or did not produce usable output
#[derive(Error, Debug)]
pub enum CommandError {
    /// The process could not be started
    #[error("failed to execute `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The process exited unsuccessfully
    #[error("`{command}` failed ({status}): {stderr}")]
    Failed {
        command: String,
        status: String,
        code: Option<i32>,
        stderr: String,
    },

    /// The process succeeded but printed nothing
    #[error("`{command}` returned no output")]
    EmptyOutput { command: String },

    /// The output could not be interpreted
    #[error("unexpected output from `{command}`: {message}")]
    UnexpectedOutput { command: String, message: String },
}

impl CommandError {
    /// Create an unexpected output error
    pub fn unexpected_output(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UnexpectedOutput {
            command: command.into(),
            message: message.into(),
        }
    }

    /// Exit code of a failed command, if it exited normally
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            CommandError::Failed { code, .. } => *code,
            _ => None,
        }
    }

    /// Captured stderr of a failed command
    pub fn stderr(&self) -> Option<&str> {
        match self {
            CommandError::Failed { stderr, .. } => Some(stderr),
            _ => None,
        }
    }
}

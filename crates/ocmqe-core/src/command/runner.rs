//! Command runners

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, trace};

use super::{CommandError, Invocation};

/// Captured result of a finished process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when terminated by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Successful output with the given stdout
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Failed output with the given exit code and stderr
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    fn status(&self) -> String {
        match self.code {
            Some(code) => format!("exit code {}", code),
            None => "terminated by signal".to_string(),
        }
    }
}

/// Runs external commands
///
/// Implementations only report what happened; the provided methods decide
/// what counts as failure.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run the command to completion and capture its output
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput, CommandError>;

    /// Run the command, treating a non-zero exit as an error
    async fn execute(&self, invocation: &Invocation) -> Result<CommandOutput, CommandError> {
        let output = self.run(invocation).await?;
        if output.success() {
            Ok(output)
        } else {
            Err(CommandError::Failed {
                command: invocation.to_string(),
                status: output.status(),
                code: output.code,
                stderr: output.stderr.trim().to_string(),
            })
        }
    }

    /// Run the command and return its trimmed stdout, which must not be empty
    async fn capture(&self, invocation: &Invocation) -> Result<String, CommandError> {
        let output = self.execute(invocation).await?;
        let stdout = output.stdout.trim();
        if stdout.is_empty() {
            return Err(CommandError::EmptyOutput {
                command: invocation.to_string(),
            });
        }
        Ok(stdout.to_string())
    }
}

/// Runs commands as local processes
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput, CommandError> {
        debug!("Running: {}", invocation);

        let mut command = Command::new(invocation.program());
        command
            .args(invocation.arguments())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        for (key, value) in invocation.envs() {
            command.env(key, value);
        }
        if let Some(dir) = invocation.working_dir() {
            command.current_dir(dir);
        }

        let output = command
            .output()
            .await
            .map_err(|source| CommandError::Spawn {
                command: invocation.to_string(),
                source,
            })?;

        let output = CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        trace!("{} -> {:?}", invocation.program(), output.code);
        Ok(output)
    }
}

/// Check if a program is available on PATH
pub fn command_exists(program: &str) -> bool {
    which::which(program).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Canned(Mutex<Vec<CommandOutput>>);

    #[async_trait]
    impl CommandRunner for Canned {
        async fn run(&self, _invocation: &Invocation) -> Result<CommandOutput, CommandError> {
            Ok(self.0.lock().unwrap().remove(0))
        }
    }

    #[tokio::test]
    async fn test_execute_rejects_nonzero_exit() {
        let runner = Canned(Mutex::new(vec![CommandOutput::failed(
            1,
            "Error: cluster not found\n",
        )]));
        let err = runner
            .execute(&Invocation::new("ocm").arg("describe"))
            .await
            .unwrap_err();

        assert_eq!(err.exit_code(), Some(1));
        assert_eq!(err.stderr(), Some("Error: cluster not found"));
        assert!(err.to_string().contains("ocm describe"));
    }

    #[tokio::test]
    async fn test_capture_trims_and_rejects_empty() {
        let runner = Canned(Mutex::new(vec![
            CommandOutput::ok("  1a2b3c\n"),
            CommandOutput::ok("\n"),
        ]));
        let inv = Invocation::new("ocm").arg("list");

        assert_eq!(runner.capture(&inv).await.unwrap(), "1a2b3c");
        assert!(matches!(
            runner.capture(&inv).await,
            Err(CommandError::EmptyOutput { .. })
        ));
    }

    #[test]
    fn test_signal_status() {
        let output = CommandOutput {
            code: None,
            ..Default::default()
        };
        assert!(!output.success());
        assert_eq!(output.status(), "terminated by signal");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_system_runner_captures_output() {
        let inv = Invocation::new("sh").args(["-c", "echo out; echo err >&2; exit 3"]);
        let output = SystemRunner::new().run(&inv).await.unwrap();

        assert_eq!(output.code, Some(3));
        assert_eq!(output.stdout, "out\n");
        assert_eq!(output.stderr, "err\n");
    }

    #[tokio::test]
    async fn test_system_runner_spawn_failure() {
        let err = SystemRunner::new()
            .run(&Invocation::new("definitely-not-a-real-binary-ocmqe"))
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::Spawn { .. }));
    }

    #[test]
    fn test_command_exists() {
        assert!(!command_exists("definitely-not-a-real-binary-ocmqe"));
    }
}

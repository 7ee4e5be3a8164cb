//! Outcome and error types for polling sessions

use std::error::Error;
use std::fmt;
use std::time::Duration;

/// Why a session stopped without converging or timing out
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalFailure<S, E> {
    /// The probe reported a state that retrying cannot fix
    State(S),

    /// The probe itself failed under the `Abort` policy
    Probe(E),
}

/// Result of one polling session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<S, E> {
    /// The observed state matched the convergence predicate
    Converged(S),

    /// The budget ran out before convergence
    TimedOut {
        /// Number of probes made
        attempts: u32,
        /// Accounted time (sum of the slept intervals)
        elapsed: Duration,
    },

    /// Polling stopped early and must not be retried
    TerminalFailure(TerminalFailure<S, E>),
}

impl<S, E> PollOutcome<S, E> {
    /// Check if the session converged
    pub fn is_converged(&self) -> bool {
        matches!(self, PollOutcome::Converged(_))
    }

    /// Check if the session timed out
    pub fn is_timed_out(&self) -> bool {
        matches!(self, PollOutcome::TimedOut { .. })
    }

    /// Check if the session ended in a terminal failure
    pub fn is_terminal_failure(&self) -> bool {
        matches!(self, PollOutcome::TerminalFailure(_))
    }

    /// Get the converged state, if any
    pub fn converged(self) -> Option<S> {
        match self {
            PollOutcome::Converged(state) => Some(state),
            _ => None,
        }
    }

    /// Convert into a `Result` so callers can use `?`
    pub fn into_result(self) -> Result<S, PollError<S, E>> {
        match self {
            PollOutcome::Converged(state) => Ok(state),
            PollOutcome::TimedOut { attempts, elapsed } => {
                Err(PollError::TimedOut { attempts, elapsed })
            }
            PollOutcome::TerminalFailure(TerminalFailure::State(state)) => {
                Err(PollError::TerminalState(state))
            }
            PollOutcome::TerminalFailure(TerminalFailure::Probe(err)) => {
                Err(PollError::ProbeFailure(err))
            }
        }
    }
}

/// Errors surfaced by a polling session that did not converge
#[derive(Debug)]
pub enum PollError<S, E> {
    /// Polled past the deadline without convergence
    TimedOut { attempts: u32, elapsed: Duration },

    /// The external system reported a terminal state
    TerminalState(S),

    /// The probe could not be run or produced no usable output
    ProbeFailure(E),
}

impl<S, E> PollError<S, E> {
    /// Check if this error is a timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, PollError::TimedOut { .. })
    }

    /// Check if this error is a terminal state
    pub fn is_terminal_state(&self) -> bool {
        matches!(self, PollError::TerminalState(_))
    }

    /// Check if this error is a probe failure
    pub fn is_probe_failure(&self) -> bool {
        matches!(self, PollError::ProbeFailure(_))
    }

    /// Map the state type using a closure
    pub fn map_state<F, S2>(self, f: F) -> PollError<S2, E>
    where
        F: FnOnce(S) -> S2,
    {
        match self {
            PollError::TimedOut { attempts, elapsed } => PollError::TimedOut { attempts, elapsed },
            PollError::TerminalState(state) => PollError::TerminalState(f(state)),
            PollError::ProbeFailure(err) => PollError::ProbeFailure(err),
        }
    }
}

impl<S: fmt::Display, E: fmt::Display> fmt::Display for PollError<S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PollError::TimedOut { attempts, elapsed } => write!(
                f,
                "timed out after {} probes over {}s",
                attempts,
                elapsed.as_secs()
            ),
            PollError::TerminalState(state) => write!(f, "reached terminal state '{}'", state),
            PollError::ProbeFailure(err) => write!(f, "probe failed: {}", err),
        }
    }
}

impl<S, E> Error for PollError<S, E>
where
    S: fmt::Debug + fmt::Display,
    E: Error + 'static,
{
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PollError::ProbeFailure(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_into_result() {
        let converged: PollOutcome<&str, io::Error> = PollOutcome::Converged("ready");
        assert_eq!(converged.into_result().unwrap(), "ready");

        let timed_out: PollOutcome<&str, io::Error> = PollOutcome::TimedOut {
            attempts: 2,
            elapsed: Duration::from_secs(120),
        };
        assert!(timed_out.into_result().unwrap_err().is_timeout());

        let terminal: PollOutcome<&str, io::Error> =
            PollOutcome::TerminalFailure(TerminalFailure::State("error"));
        assert!(matches!(
            terminal.into_result(),
            Err(PollError::TerminalState("error"))
        ));
    }

    #[test]
    fn test_check_failure_source() {
        let err: PollError<String, io::Error> =
            PollError::ProbeFailure(io::Error::other("ocm: command not found"));
        assert!(err.is_probe_failure());
        assert!(err.source().is_some());
        assert!(err.to_string().contains("command not found"));
    }

    #[test]
    fn test_map_state() {
        let err: PollError<u8, io::Error> = PollError::TerminalState(7);
        let mapped = err.map_state(|s| format!("state-{}", s));
        assert!(matches!(mapped, PollError::TerminalState(ref s) if s == "state-7"));
    }

    #[test]
    fn test_display() {
        let err: PollError<String, io::Error> = PollError::TimedOut {
            attempts: 3,
            elapsed: Duration::from_secs(180),
        };
        assert_eq!(err.to_string(), "timed out after 3 probes over 180s");
    }
}

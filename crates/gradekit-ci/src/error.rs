//! Error types for command execution.

use thiserror::Error;

/// Reasons a command could not produce a completed [`ProcessOutput`](crate::ProcessOutput).
///
/// A non-zero exit is not an error at this layer; it is reported through
/// `ProcessOutput::exit_code` and judged by the stage interpreters.
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Stage {stage} has empty command")]
    EmptyCommand { stage: String },

    #[error("Failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` timed out after {timeout_secs} seconds")]
    Timeout { command: String, timeout_secs: u64 },

    #[error("I/O error while running `{command}`: {source}")]
    Io {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

impl RunnerError {
    /// Whether the failure was the timeout budget elapsing.
    pub fn is_timeout(&self) -> bool {
        matches!(self, RunnerError::Timeout { .. })
    }
}

/// Result type for command execution.
pub type Result<T> = std::result::Result<T, RunnerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message_names_budget() {
        let err = RunnerError::Timeout {
            command: "flutter test".to_string(),
            timeout_secs: 120,
        };
        assert!(err.is_timeout());
        assert!(err.to_string().contains("timed out after 120 seconds"));
    }

    #[test]
    fn test_spawn_error_is_not_timeout() {
        let err = RunnerError::Spawn {
            command: "flutter pub get".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert!(!err.is_timeout());
        assert!(err.to_string().contains("Failed to start"));
    }
}

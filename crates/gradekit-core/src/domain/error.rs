//! Error taxonomy surfaced by the grading pipeline.
//!
//! Grading outcomes (clone failure, missing files, failing builds or tests,
//! an unavailable evaluator) are not errors: they produce a scored
//! [`EvaluationResponse`](super::EvaluationResponse). Only the cases below
//! abort a run.

/// Which side of the boundary a [`GradeError`] is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Client,
    Server,
}

/// Errors that abort an evaluation.
#[derive(Debug, thiserror::Error)]
pub enum GradeError {
    /// Malformed or disallowed repository locator.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The deployment cannot perform evaluations (e.g. missing credential).
    #[error("server configuration error: {0}")]
    Configuration(String),

    /// Anything unclassified, with the original message preserved.
    #[error("evaluation failed: {0}")]
    Internal(String),
}

impl GradeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GradeError::InvalidRequest(_) => ErrorKind::Client,
            GradeError::Configuration(_) | GradeError::Internal(_) => ErrorKind::Server,
        }
    }

    /// HTTP status an inbound controller should answer with.
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::Client => 400,
            ErrorKind::Server => 500,
        }
    }

    /// Re-raise typed errors unchanged, wrap everything else as `Internal`.
    pub fn classify(err: anyhow::Error) -> Self {
        match err.downcast::<GradeError>() {
            Ok(typed) => typed,
            Err(other) => GradeError::Internal(format!("{other:#}")),
        }
    }
}

/// Result type for grading operations.
pub type Result<T> = std::result::Result<T, GradeError>;

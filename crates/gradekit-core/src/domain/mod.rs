//! Domain types for grading runs.

pub mod check;
pub mod error;
pub mod quality;
pub mod request;
pub mod response;

pub use check::{CheckResult, ScoreBudget};
pub use error::{ErrorKind, GradeError, Result};
pub use quality::LlmEvaluationResult;
pub use request::EvaluationRequest;
pub use response::{EvaluationDetails, EvaluationResponse};

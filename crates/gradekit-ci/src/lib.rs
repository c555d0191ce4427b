//! gradekit CI - toolchain execution for grading runs
//!
//! Provides the subprocess layer of the grading pipeline:
//! - Runs toolchain commands with a working directory and timeout
//! - Interprets captured output with per-stage heuristics
//! - Sequences analysis with a full-build fallback

pub mod error;
pub mod interpret;
pub mod runner;
pub mod stage;
pub mod toolchain;

// Re-export key types
pub use error::RunnerError;
pub use interpret::{
    AnalyzeInterpreter, BuildHeuristic, BuildInterpreter, InstallInterpreter, StageInterpreter,
    StageOutcome, TestInterpreter, TestVerdict,
};
pub use runner::{CommandRunner, ProcessOutput};
pub use stage::{StageConfig, ToolStage, ToolchainConfig};
pub use toolchain::Toolchain;

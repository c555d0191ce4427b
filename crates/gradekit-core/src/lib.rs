//! GradeKit Core Library
//!
//! Grades Flutter assignment repositories: clone, structure check,
//! dependency install, build, tests and an LLM code-quality review,
//! folded into one scored [`EvaluationResponse`].

pub mod collect;
pub mod config;
pub mod domain;
pub mod evaluator;
pub mod fetch;
pub mod obs;
pub mod pipeline;
pub mod policy;
pub mod structure;
pub mod telemetry;
pub mod workspace;

pub use domain::{
    CheckResult, ErrorKind, EvaluationDetails, EvaluationRequest, EvaluationResponse, GradeError,
    LlmEvaluationResult, Result, ScoreBudget,
};

pub use collect::{collect_dart_sources, collect_sources, CollectedFile};
pub use config::GraderConfig;
pub use evaluator::{CompletionClient, CompletionError, EvaluatorConfig, LlmEvaluator};
pub use fetch::{FetchError, GitFetcher, RepoLocator, RepositoryFetcher};
pub use pipeline::{Grader, PipelineState};
pub use policy::{PipelineStage, ScoringPolicy, StagePolicy, MAX_SCORE};
pub use structure::{validate_structure, StructureStatus};
pub use workspace::Workspace;

pub use gradekit_ci::{BuildHeuristic, StageConfig, Toolchain, ToolchainConfig};

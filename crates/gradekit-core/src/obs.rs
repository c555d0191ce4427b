//! Structured observability hooks for the evaluation lifecycle.
//!
//! Events are emitted at `info!` level unless noted (filter with `RUST_LOG`).

use std::path::Path;

use tracing::{info, warn};

use crate::domain::EvaluationResponse;
use crate::pipeline::PipelineState;

/// Span that tags every log line of one evaluation with its id.
///
/// Attach it with [`tracing::Instrument`] so it follows the evaluation
/// future across await points.
pub fn evaluation_span(evaluation_id: &str, repository: &str) -> tracing::Span {
    tracing::info_span!(
        "gradekit.evaluation",
        evaluation_id = %evaluation_id,
        repository = %repository
    )
}

pub fn emit_evaluation_started(evaluation_id: &str, repository: &str) {
    info!(event = "evaluation.started", evaluation_id = %evaluation_id, repository = %repository);
}

pub fn emit_state_transition(from: PipelineState, to: PipelineState) {
    info!(event = "pipeline.transition", from = ?from, to = ?to);
}

pub fn emit_stage_finished(check: &str, passed: bool, score: u32) {
    info!(event = "pipeline.stage_finished", check = %check, passed = passed, score = score);
}

pub fn emit_evaluation_finished(evaluation_id: &str, response: &EvaluationResponse) {
    info!(
        event = "evaluation.finished",
        evaluation_id = %evaluation_id,
        total_score = response.total_score,
        max_score = response.max_score,
        checks_passed = response.passed_count(),
        checks_failed = response.failed_count(),
        duration_ms = response.duration_ms,
    );
}

/// Emitted at `warn` level; removal failures never fail an evaluation.
pub fn emit_cleanup_failed(path: &Path, error: &dyn std::fmt::Display) {
    warn!(event = "workspace.cleanup_failed", path = %path.display(), error = %error);
}

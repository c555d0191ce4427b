//! Grading pipeline orchestration.
//!
//! Walks the [`ScoringPolicy`] table stage by stage inside a freshly created
//! [`Workspace`], stops at the first failing gating stage, and always removes
//! the workspace before returning.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use chrono::Utc;
use gradekit_ci::{StageOutcome, Toolchain};
use tracing::{info, Instrument};

use crate::collect::{collect_sources, SOURCE_EXTENSION, SOURCE_SUBTREE};
use crate::config::GraderConfig;
use crate::domain::{
    CheckResult, EvaluationDetails, EvaluationRequest, EvaluationResponse, GradeError,
    LlmEvaluationResult, Result, ScoreBudget,
};
use crate::evaluator::LlmEvaluator;
use crate::fetch::{GitFetcher, RepoLocator, RepositoryFetcher};
use crate::obs;
use crate::policy::{PipelineStage, ScoringPolicy, StagePolicy};
use crate::structure::validate_structure;
use crate::workspace::Workspace;

/// States of one evaluation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    ValidatingInput,
    Cloning,
    ValidatingStructure,
    Installing,
    Building,
    Testing,
    Collecting,
    Evaluating,
    Done,
    FailedStructural,
    FailedGating,
}

impl PipelineState {
    fn entering(stage: PipelineStage) -> Self {
        match stage {
            PipelineStage::Clone => PipelineState::Cloning,
            PipelineStage::Structure => PipelineState::ValidatingStructure,
            PipelineStage::Install => PipelineState::Installing,
            PipelineStage::Build => PipelineState::Building,
            PipelineStage::Tests => PipelineState::Testing,
            PipelineStage::CodeQuality => PipelineState::Collecting,
        }
    }

    fn failed_at(stage: PipelineStage) -> Self {
        match stage {
            PipelineStage::Clone | PipelineStage::Structure => PipelineState::FailedStructural,
            _ => PipelineState::FailedGating,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PipelineState::Done | PipelineState::FailedStructural | PipelineState::FailedGating
        )
    }
}

/// Mutable bookkeeping of a run in progress.
struct RunState {
    state: PipelineState,
    /// Gating row that stopped the run, if any.
    halted: Option<StagePolicy>,
    budget: ScoreBudget,
    checks: Vec<CheckResult>,
    details: EvaluationDetails,
}

impl RunState {
    fn new(max_score: u32) -> Self {
        Self {
            state: PipelineState::ValidatingInput,
            halted: None,
            budget: ScoreBudget::new(max_score),
            checks: Vec::new(),
            details: EvaluationDetails::default(),
        }
    }

    fn transition(&mut self, next: PipelineState) {
        if self.state != next {
            obs::emit_state_transition(self.state, next);
            self.state = next;
        }
    }
}

/// What a stage produced, before the policy turns it into points.
struct StageReport {
    outcome: StageOutcome,
    /// Points claimed by the stage; `None` means the policy's fixed points.
    claimed: Option<u32>,
}

impl From<StageOutcome> for StageReport {
    fn from(outcome: StageOutcome) -> Self {
        Self {
            outcome,
            claimed: None,
        }
    }
}

/// Grades repositories end to end.
pub struct Grader {
    workspace_root: PathBuf,
    allowed_hosts: Vec<String>,
    policy: ScoringPolicy,
    fetcher: Arc<dyn RepositoryFetcher>,
    toolchain: Toolchain,
    evaluator: LlmEvaluator,
}

impl Grader {
    pub fn new(
        workspace_root: PathBuf,
        allowed_hosts: Vec<String>,
        policy: ScoringPolicy,
        fetcher: Arc<dyn RepositoryFetcher>,
        toolchain: Toolchain,
        evaluator: LlmEvaluator,
    ) -> Result<Self> {
        policy
            .validate()
            .map_err(|e| GradeError::Configuration(format!("invalid scoring policy: {e}")))?;
        Ok(Self {
            workspace_root,
            allowed_hosts,
            policy,
            fetcher,
            toolchain,
            evaluator,
        })
    }

    /// Grader using `git`, the configured toolchain and the HTTP evaluator.
    pub fn from_config(config: GraderConfig) -> Result<Self> {
        let fetcher = Arc::new(GitFetcher::new(config.git_bin, config.clone_timeout_secs));
        let evaluator = LlmEvaluator::from_config(config.evaluator)?;
        Self::new(
            config.workspace_root,
            config.allowed_hosts,
            config.policy,
            fetcher,
            Toolchain::new(config.toolchain),
            evaluator,
        )
    }

    pub fn policy(&self) -> &ScoringPolicy {
        &self.policy
    }

    /// Validate a repository URL without side effects.
    pub fn locate(&self, raw_url: &str) -> Result<RepoLocator> {
        RepoLocator::parse(raw_url, &self.allowed_hosts)
    }

    /// Check the inbound request's shape, then grade it.
    pub async fn evaluate_request(
        &self,
        request: &EvaluationRequest,
    ) -> Result<EvaluationResponse> {
        request.validate()?;
        self.evaluate(&request.repository_url).await
    }

    /// Grade the repository at `raw_url`.
    ///
    /// Grading outcomes, including failed stages, are returned as `Ok`. Errors
    /// are an invalid locator, a configuration defect, or an unclassified
    /// failure. The workspace is removed on every path.
    pub async fn evaluate(&self, raw_url: &str) -> Result<EvaluationResponse> {
        let locator = self.locate(raw_url)?;

        let evaluation_id = uuid::Uuid::new_v4().to_string();
        let span = obs::evaluation_span(&evaluation_id, locator.url());
        self.evaluate_located(&evaluation_id, &locator)
            .instrument(span)
            .await
    }

    async fn evaluate_located(
        &self,
        evaluation_id: &str,
        locator: &RepoLocator,
    ) -> Result<EvaluationResponse> {
        obs::emit_evaluation_started(evaluation_id, locator.url());
        let start = Instant::now();

        let workspace = Workspace::create(&self.workspace_root, &locator.workspace_dir_name())
            .with_context(|| {
                format!("creating workspace under {}", self.workspace_root.display())
            })
            .map_err(GradeError::classify)?;

        let result = self.run_stages(locator, workspace.path()).await;

        let path = workspace.path().to_path_buf();
        if let Err(e) = workspace.cleanup().await {
            obs::emit_cleanup_failed(&path, &e);
        }

        let run = result.map_err(GradeError::classify)?;
        let duration_ms = start.elapsed().as_millis() as u64;
        let response = self.assemble(locator, run, duration_ms);
        obs::emit_evaluation_finished(evaluation_id, &response);
        Ok(response)
    }

    async fn run_stages(
        &self,
        locator: &RepoLocator,
        workspace: &Path,
    ) -> anyhow::Result<RunState> {
        let mut run = RunState::new(self.policy.max_score);

        for row in &self.policy.stages {
            run.transition(PipelineState::entering(row.stage));

            let report = self.run_stage(row, locator, workspace, &mut run).await?;
            let passed = report.outcome.success;
            let awarded = if passed {
                run.budget.award(report.claimed.unwrap_or(row.points))
            } else {
                0
            };
            record_detail(&mut run.details, row.stage, passed);

            obs::emit_stage_finished(row.stage.check_name(), passed, awarded);
            run.checks.push(CheckResult::new(
                row.stage.check_name(),
                passed,
                report.outcome.message,
                awarded,
            ));

            if !passed && row.gating {
                run.halted = Some(*row);
                run.transition(PipelineState::failed_at(row.stage));
                return Ok(run);
            }
        }

        run.transition(PipelineState::Done);
        Ok(run)
    }

    async fn run_stage(
        &self,
        row: &StagePolicy,
        locator: &RepoLocator,
        workspace: &Path,
        run: &mut RunState,
    ) -> anyhow::Result<StageReport> {
        let report: StageReport = match row.stage {
            PipelineStage::Clone => match self.fetcher.fetch(locator, workspace).await {
                Ok(()) => StageOutcome::success("Repository cloned successfully").into(),
                Err(e) => StageOutcome::failure(format!("Failed to clone repository: {e}")).into(),
            },
            PipelineStage::Structure => {
                let status = validate_structure(workspace);
                StageReport::from(StageOutcome {
                    success: status.is_valid(),
                    message: status.message(),
                    raw_output: None,
                })
            }
            PipelineStage::Install => self.toolchain.install(workspace).await.into(),
            PipelineStage::Build => self.toolchain.build(workspace).await.into(),
            PipelineStage::Tests => self.toolchain.test(workspace).await.into(),
            PipelineStage::CodeQuality => {
                let max = row.points.min(run.budget.remaining());
                self.quality_stage(workspace, max, run).await?
            }
        };
        Ok(report)
    }

    async fn quality_stage(
        &self,
        workspace: &Path,
        max_score: u32,
        run: &mut RunState,
    ) -> anyhow::Result<StageReport> {
        let root = workspace.to_path_buf();
        let files = tokio::task::spawn_blocking(move || {
            collect_sources(&root, SOURCE_SUBTREE, SOURCE_EXTENSION)
        })
        .await
        .context("source collection task failed")?;

        if files.is_empty() {
            let message =
                format!("No readable .{SOURCE_EXTENSION} files found under {SOURCE_SUBTREE}/");
            run.details.code_quality = Some(LlmEvaluationResult::new(
                0,
                max_score,
                &message,
                Vec::new(),
                Vec::new(),
                "Add application source code under lib/.",
            ));
            return Ok(StageOutcome::failure(message).into());
        }

        run.transition(PipelineState::Evaluating);
        info!(files = files.len(), max_score = max_score, "Evaluating code quality");
        let result = self.evaluator.evaluate(&files, max_score).await?;

        let report = StageReport {
            outcome: StageOutcome {
                success: result.score > 0,
                message: format!(
                    "Quality score {}/{}: {}",
                    result.score, max_score, result.summary
                ),
                raw_output: None,
            },
            claimed: Some(result.score),
        };
        run.details.code_quality = Some(result);
        Ok(report)
    }

    fn assemble(
        &self,
        locator: &RepoLocator,
        run: RunState,
        duration_ms: u64,
    ) -> EvaluationResponse {
        let max_score = self.policy.max_score;
        let total_score = match run.halted {
            Some(row) => run.budget.capped_total(row.failure_cap),
            None => run.budget.earned().min(max_score),
        };
        let halted_at = run.halted.and_then(|_| run.checks.last());

        let feedback = compose_feedback(
            total_score,
            max_score,
            halted_at,
            &run.checks,
            run.details.code_quality.as_ref(),
        );

        EvaluationResponse {
            total_score,
            max_score,
            checks: run.checks,
            feedback,
            details: run.details,
            repository: locator.url().to_string(),
            evaluated_at: Utc::now(),
            duration_ms,
        }
    }
}

fn record_detail(details: &mut EvaluationDetails, stage: PipelineStage, passed: bool) {
    match stage {
        PipelineStage::Clone => details.clone_successful = passed,
        PipelineStage::Structure => details.files_valid = passed,
        PipelineStage::Install => details.pub_get_successful = passed,
        PipelineStage::Build => details.build_successful = passed,
        PipelineStage::Tests => details.tests_passed = passed,
        PipelineStage::CodeQuality => {}
    }
}

fn compose_feedback(
    total_score: u32,
    max_score: u32,
    halted_at: Option<&CheckResult>,
    checks: &[CheckResult],
    quality: Option<&LlmEvaluationResult>,
) -> String {
    if let Some(check) = halted_at {
        return format!(
            "Evaluation stopped at '{}': {}. Final score: {total_score}/{max_score}.",
            check.name, check.message
        );
    }

    let mut parts = vec![format!("Final score: {total_score}/{max_score}.")];
    let failed: Vec<&str> = checks
        .iter()
        .filter(|c| !c.passed)
        .map(|c| c.name.as_str())
        .collect();
    if failed.is_empty() {
        parts.push("All checks passed.".to_string());
    } else {
        parts.push(format!("Checks not passed: {}.", failed.join(", ")));
    }
    if let Some(quality) = quality {
        parts.push(quality.summary.clone());
        if !quality.recommendation.is_empty() {
            parts.push(format!("Recommendation: {}", quality.recommendation));
        }
    }
    parts.join(" ")
}

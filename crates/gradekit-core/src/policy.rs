//! Scoring policy as data: which stages run, in what order, what they are
//! worth and how failures cap the total.

use serde::{Deserialize, Serialize};

/// Reference maximum score.
pub const MAX_SCORE: u32 = 20;

/// A scored stage of the grading pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Clone,
    Structure,
    Install,
    Build,
    Tests,
    CodeQuality,
}

impl PipelineStage {
    /// Name used for the stage's [`CheckResult`](crate::CheckResult).
    pub fn check_name(&self) -> &'static str {
        match self {
            PipelineStage::Clone => "Clone Repository",
            PipelineStage::Structure => "File Structure",
            PipelineStage::Install => "Install Dependencies",
            PipelineStage::Build => "Build",
            PipelineStage::Tests => "Unit Tests",
            PipelineStage::CodeQuality => "Code Quality",
        }
    }
}

/// One row of the policy table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagePolicy {
    pub stage: PipelineStage,

    /// Failure halts the pipeline.
    pub gating: bool,

    /// Points awarded on success. For `CodeQuality` this is the ceiling
    /// handed to the evaluator.
    pub points: u32,

    /// Upper bound on the total when a gating failure halts here.
    pub failure_cap: u32,
}

impl StagePolicy {
    pub fn gating(stage: PipelineStage, points: u32, failure_cap: u32) -> Self {
        Self {
            stage,
            gating: true,
            points,
            failure_cap,
        }
    }

    pub fn scored(stage: PipelineStage, points: u32) -> Self {
        Self {
            stage,
            gating: false,
            points,
            failure_cap: u32::MAX,
        }
    }
}

/// Ordered policy table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringPolicy {
    pub max_score: u32,
    pub stages: Vec<StagePolicy>,
}

impl ScoringPolicy {
    /// Clone and structure failures score 0, install and build failures are
    /// capped at 5, tests are worth 5 and code quality up to 15.
    pub fn reference() -> Self {
        Self {
            max_score: MAX_SCORE,
            stages: vec![
                StagePolicy::gating(PipelineStage::Clone, 0, 0),
                StagePolicy::gating(PipelineStage::Structure, 0, 0),
                StagePolicy::gating(PipelineStage::Install, 0, 5),
                StagePolicy::gating(PipelineStage::Build, 0, 5),
                StagePolicy::scored(PipelineStage::Tests, 5),
                StagePolicy::scored(PipelineStage::CodeQuality, 15),
            ],
        }
    }

    /// Check the table is usable: clone first, no duplicates, points fit.
    pub fn validate(&self) -> Result<(), String> {
        match self.stages.first() {
            Some(first) if first.stage == PipelineStage::Clone => {}
            _ => return Err("policy must start with the clone stage".to_string()),
        }

        for (i, row) in self.stages.iter().enumerate() {
            if self.stages[..i].iter().any(|r| r.stage == row.stage) {
                return Err(format!("stage {:?} listed more than once", row.stage));
            }
        }

        let total: u32 = self.stages.iter().map(|r| r.points).sum();
        if total > self.max_score {
            return Err(format!(
                "stage points sum to {total}, above the maximum of {}",
                self.max_score
            ));
        }
        Ok(())
    }
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self::reference()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_policy_is_valid() {
        let policy = ScoringPolicy::reference();
        assert!(policy.validate().is_ok());
        assert_eq!(policy.max_score, 20);
        let total: u32 = policy.stages.iter().map(|s| s.points).sum();
        assert_eq!(total, 20);
    }

    #[test]
    fn test_reference_caps_and_gating() {
        let policy = ScoringPolicy::reference();
        let row = |stage| policy.stages.iter().find(|r| r.stage == stage).unwrap();
        assert_eq!(row(PipelineStage::Clone).failure_cap, 0);
        assert_eq!(row(PipelineStage::Structure).failure_cap, 0);
        assert_eq!(row(PipelineStage::Install).failure_cap, 5);
        assert_eq!(row(PipelineStage::Build).failure_cap, 5);
        assert!(!row(PipelineStage::Tests).gating);
        assert!(!row(PipelineStage::CodeQuality).gating);
    }

    #[test]
    fn test_validate_rejects_bad_tables() {
        let mut policy = ScoringPolicy::reference();
        policy.stages.swap(0, 1);
        assert!(policy.validate().unwrap_err().contains("clone"));

        let mut policy = ScoringPolicy::reference();
        policy.stages.push(StagePolicy::scored(PipelineStage::Tests, 0));
        assert!(policy.validate().unwrap_err().contains("more than once"));

        let mut policy = ScoringPolicy::reference();
        policy.max_score = 10;
        assert!(policy.validate().unwrap_err().contains("above the maximum"));
    }

    #[test]
    fn test_check_names() {
        assert_eq!(PipelineStage::Clone.check_name(), "Clone Repository");
        assert_eq!(PipelineStage::CodeQuality.check_name(), "Code Quality");
    }
}

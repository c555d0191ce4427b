//! Outbound evaluation response.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::check::CheckResult;
use super::quality::LlmEvaluationResult;

/// Which stages ran and how they ended.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationDetails {
    pub clone_successful: bool,
    pub files_valid: bool,
    pub pub_get_successful: bool,
    pub build_successful: bool,
    pub tests_passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_quality: Option<LlmEvaluationResult>,
}

/// Terminal artifact of one evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResponse {
    pub total_score: u32,
    pub max_score: u32,
    pub checks: Vec<CheckResult>,
    pub feedback: String,
    pub details: EvaluationDetails,
    pub repository: String,
    pub evaluated_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl EvaluationResponse {
    pub fn check(&self, name: &str) -> Option<&CheckResult> {
        self.checks.iter().find(|c| c.name == name)
    }

    pub fn passed_count(&self) -> usize {
        self.checks.iter().filter(|c| c.passed).count()
    }

    pub fn failed_count(&self) -> usize {
        self.checks.iter().filter(|c| !c.passed).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response() -> EvaluationResponse {
        EvaluationResponse {
            total_score: 5,
            max_score: 20,
            checks: vec![
                CheckResult::new("Clone Repository", true, "Repository cloned", 0),
                CheckResult::new("Unit Tests", false, "Some tests failed", 0),
            ],
            feedback: "done".to_string(),
            details: EvaluationDetails {
                clone_successful: true,
                ..Default::default()
            },
            repository: "https://github.com/acme/app".to_string(),
            evaluated_at: Utc::now(),
            duration_ms: 12,
        }
    }

    #[test]
    fn test_counts() {
        let r = response();
        assert_eq!(r.passed_count(), 1);
        assert_eq!(r.failed_count(), 1);
        assert!(r.check("Unit Tests").is_some());
        assert!(r.check("Code Quality").is_none());
    }

    #[test]
    fn test_serializes_camel_case_shape() {
        let value = serde_json::to_value(response()).unwrap();
        assert_eq!(value["totalScore"], 5);
        assert_eq!(value["maxScore"], 20);
        assert_eq!(value["checks"][0]["name"], "Clone Repository");
        assert_eq!(value["details"]["cloneSuccessful"], true);
        assert_eq!(value["details"]["pubGetSuccessful"], false);
        assert!(value["details"].get("codeQuality").is_none());
    }
}

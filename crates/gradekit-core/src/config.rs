//! Grader configuration.

use std::path::PathBuf;

use gradekit_ci::ToolchainConfig;
use serde::{Deserialize, Serialize};

use crate::evaluator::EvaluatorConfig;
use crate::fetch::{CLONE_TIMEOUT_SECS, DEFAULT_ALLOWED_HOSTS};
use crate::policy::ScoringPolicy;

pub const ENV_WORKSPACE_ROOT: &str = "GRADEKIT_WORKSPACE_ROOT";
pub const ENV_FLUTTER_BIN: &str = "GRADEKIT_FLUTTER_BIN";
pub const ENV_LLM_BASE_URL: &str = "GRADEKIT_LLM_BASE_URL";
pub const ENV_LLM_MODEL: &str = "GRADEKIT_LLM_MODEL";
pub const ENV_API_KEY: &str = "OPENAI_API_KEY";

/// Everything a [`Grader`](crate::Grader) needs, with reference defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraderConfig {
    /// Parent directory for per-run workspaces.
    pub workspace_root: PathBuf,

    /// Repository hosts accepted for evaluation.
    pub allowed_hosts: Vec<String>,

    pub git_bin: String,
    pub clone_timeout_secs: u64,

    pub toolchain: ToolchainConfig,
    pub evaluator: EvaluatorConfig,
    pub policy: ScoringPolicy,
}

impl Default for GraderConfig {
    fn default() -> Self {
        Self {
            workspace_root: std::env::temp_dir().join("gradekit"),
            allowed_hosts: DEFAULT_ALLOWED_HOSTS.iter().map(|h| h.to_string()).collect(),
            git_bin: "git".to_string(),
            clone_timeout_secs: CLONE_TIMEOUT_SECS,
            toolchain: ToolchainConfig::default(),
            evaluator: EvaluatorConfig::default(),
            policy: ScoringPolicy::reference(),
        }
    }
}

impl GraderConfig {
    /// Reference defaults overlaid with environment variables.
    pub fn from_env() -> Self {
        Self::default().with_env(|key| std::env::var(key).ok())
    }

    /// Point every toolchain stage at `executable`, keeping the build heuristic.
    pub fn with_flutter_bin(mut self, executable: &str) -> Self {
        self.toolchain =
            ToolchainConfig::flutter(executable).with_build_heuristic(self.toolchain.build_heuristic);
        self
    }

    /// Overlay values from `lookup`; blank values are ignored.
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(root) = get(ENV_WORKSPACE_ROOT) {
            self.workspace_root = PathBuf::from(root);
        }
        if let Some(flutter) = get(ENV_FLUTTER_BIN) {
            self = self.with_flutter_bin(&flutter);
        }
        if let Some(base) = get(ENV_LLM_BASE_URL) {
            self.evaluator.api_base = base;
        }
        if let Some(model) = get(ENV_LLM_MODEL) {
            self.evaluator.model = model;
        }
        if let Some(key) = get(ENV_API_KEY) {
            self.evaluator.api_key = Some(key);
        }
        self
    }
}

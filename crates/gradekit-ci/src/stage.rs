//! Toolchain stage definitions and configuration.

use serde::{Deserialize, Serialize};

use crate::interpret::BuildHeuristic;

/// Toolchain stages run against a cloned workspace.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ToolStage {
    /// flutter pub get
    Install,

    /// flutter analyze
    Analyze,

    /// flutter build apk --debug (fallback when analysis cannot run)
    Build,

    /// flutter test
    Test,
}

impl ToolStage {
    /// Get the stage name as a string.
    pub fn name(&self) -> &'static str {
        match self {
            ToolStage::Install => "pub_get",
            ToolStage::Analyze => "analyze",
            ToolStage::Build => "build",
            ToolStage::Test => "test",
        }
    }

    /// Arguments passed to the toolchain executable for this stage.
    pub fn args(&self) -> &'static [&'static str] {
        match self {
            ToolStage::Install => &["pub", "get"],
            ToolStage::Analyze => &["analyze"],
            ToolStage::Build => &["build", "apk", "--debug"],
            ToolStage::Test => &["test"],
        }
    }

    /// Reference timeout budget in seconds.
    pub fn default_timeout_secs(&self) -> u64 {
        match self {
            ToolStage::Install => 60,
            ToolStage::Analyze | ToolStage::Build | ToolStage::Test => 120,
        }
    }
}

/// Configuration for one command invocation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StageConfig {
    /// Human-readable stage name.
    pub name: String,

    /// Command to execute (first element is executable).
    pub command: Vec<String>,

    /// Timeout in seconds (0 disables the timeout).
    pub timeout_secs: u64,
}

impl StageConfig {
    /// Build the reference configuration for `stage` using `executable`.
    pub fn for_stage(stage: ToolStage, executable: &str) -> Self {
        let mut command = vec![executable.to_string()];
        command.extend(stage.args().iter().map(|a| a.to_string()));
        Self {
            name: stage.name().to_string(),
            command,
            timeout_secs: stage.default_timeout_secs(),
        }
    }

    /// Create a custom stage configuration.
    pub fn custom(name: impl Into<String>, command: Vec<String>, timeout_secs: u64) -> Self {
        Self {
            name: name.into(),
            command,
            timeout_secs,
        }
    }

    /// Run `script` through `sh -c`.
    pub fn shell(name: impl Into<String>, script: &str, timeout_secs: u64) -> Self {
        Self::custom(
            name,
            vec!["sh".to_string(), "-c".to_string(), script.to_string()],
            timeout_secs,
        )
    }

    /// Command line joined for display in logs and messages.
    pub fn display_command(&self) -> String {
        self.command.join(" ")
    }
}

/// The full set of toolchain commands a grading run uses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolchainConfig {
    pub install: StageConfig,
    pub analyze: StageConfig,
    pub build: StageConfig,
    pub test: StageConfig,

    /// How analysis output is judged when the analyzer exits cleanly.
    #[serde(default)]
    pub build_heuristic: BuildHeuristic,
}

impl ToolchainConfig {
    /// Reference Flutter toolchain, invoking `executable` for every stage.
    pub fn flutter(executable: &str) -> Self {
        Self {
            install: StageConfig::for_stage(ToolStage::Install, executable),
            analyze: StageConfig::for_stage(ToolStage::Analyze, executable),
            build: StageConfig::for_stage(ToolStage::Build, executable),
            test: StageConfig::for_stage(ToolStage::Test, executable),
            build_heuristic: BuildHeuristic::default(),
        }
    }

    pub fn with_build_heuristic(mut self, heuristic: BuildHeuristic) -> Self {
        self.build_heuristic = heuristic;
        self
    }
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self::flutter("flutter")
    }
}

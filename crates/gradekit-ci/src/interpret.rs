//! Per-stage pass/fail heuristics over captured toolchain output.
//!
//! Toolchain output is free text and changes between releases. Each stage
//! owns one interpreter so version drift is absorbed here and nowhere else.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::RunnerError;
use crate::runner::ProcessOutput;

/// Maximum number of output characters kept on a [`StageOutcome`].
pub const RAW_OUTPUT_LIMIT: usize = 4000;

static ANALYZER_ERROR_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^\s*error\s*(?:•|-|\|)").expect("valid regex"));

static PASS_COUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\+\d+").expect("valid regex"));

static FAIL_COUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s-\d+:").expect("valid regex"));

const ALL_TESTS_PASSED: &str = "All tests passed!";
const SOME_TESTS_FAILED: &str = "Some tests failed";
const NO_TESTS_MARKERS: &[&str] = &[
    "No tests ran",
    "No tests were found",
    "Test directory \"test\" not found",
];

/// Result of one stage, as seen by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageOutcome {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_output: Option<String>,
}

impl StageOutcome {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            raw_output: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            raw_output: None,
        }
    }

    /// Attach the tail of `output`, bounded by [`RAW_OUTPUT_LIMIT`].
    pub fn with_raw_output(mut self, output: &str) -> Self {
        if !output.trim().is_empty() {
            self.raw_output = Some(tail_chars(output, RAW_OUTPUT_LIMIT));
        }
        self
    }
}

/// Keep the last `limit` characters of `text`.
fn tail_chars(text: &str, limit: usize) -> String {
    let count = text.chars().count();
    if count <= limit {
        return text.to_string();
    }
    text.chars().skip(count - limit).collect()
}

fn first_line(text: &str) -> &str {
    text.lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("")
}

/// Turns a command result into a [`StageOutcome`].
pub trait StageInterpreter: Send + Sync {
    fn interpret(&self, result: &Result<ProcessOutput, RunnerError>) -> StageOutcome;
}

// ---------------------------------------------------------------------------
// Install
// ---------------------------------------------------------------------------

/// `pub get` passes unless stderr carries something other than warnings.
#[derive(Debug, Default, Clone, Copy)]
pub struct InstallInterpreter;

impl InstallInterpreter {
    /// Non-blank stderr lines that are not part of a warning.
    ///
    /// Indented lines continue the preceding line's classification.
    pub fn offending_lines(stderr: &str) -> Vec<&str> {
        let mut offending = Vec::new();
        let mut in_warning = false;
        for line in stderr.lines() {
            if line.trim().is_empty() {
                continue;
            }
            let continuation = line.starts_with(char::is_whitespace);
            if !continuation {
                in_warning = line.to_lowercase().contains("warning");
            }
            if !in_warning {
                offending.push(line.trim());
            }
        }
        offending
    }
}

impl StageInterpreter for InstallInterpreter {
    fn interpret(&self, result: &Result<ProcessOutput, RunnerError>) -> StageOutcome {
        let output = match result {
            Ok(output) => output,
            Err(e) => return StageOutcome::failure(format!("Dependency install failed: {e}")),
        };

        if !output.succeeded() {
            return StageOutcome::failure(format!(
                "Dependency install exited with code {}",
                exit_code_label(output)
            ))
            .with_raw_output(&output.combined());
        }

        let offending = Self::offending_lines(&output.stderr);
        match offending.first() {
            None => StageOutcome::success("Dependencies installed successfully"),
            Some(line) => StageOutcome::failure(format!("Dependency install reported errors: {line}"))
                .with_raw_output(&output.stderr),
        }
    }
}

// ---------------------------------------------------------------------------
// Analyze / build
// ---------------------------------------------------------------------------

/// How analysis output is judged once the analyzer exits with status 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildHeuristic {
    /// Fail when any diagnostic line has `error` severity.
    #[default]
    SeverityLines,

    /// Fail when the text contains `error` and does not contain `info`.
    ///
    /// Kept for parity with graders that used a plain substring check. Output
    /// holding both an info diagnostic and an unrelated error passes.
    LegacySubstring,
}

impl BuildHeuristic {
    /// Number of error diagnostics found, or `None` when the output passes.
    pub fn errors_in(&self, output: &str) -> Option<usize> {
        match self {
            BuildHeuristic::SeverityLines => {
                let count = ANALYZER_ERROR_LINE.find_iter(output).count();
                (count > 0).then_some(count)
            }
            BuildHeuristic::LegacySubstring => {
                (output.contains("error") && !output.contains("info")).then_some(1)
            }
        }
    }
}

/// Judges a cleanly-exited analyzer run.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnalyzeInterpreter {
    pub heuristic: BuildHeuristic,
}

impl AnalyzeInterpreter {
    pub fn new(heuristic: BuildHeuristic) -> Self {
        Self { heuristic }
    }

    /// Whether the analyzer ran to a clean exit, i.e. its output is worth judging.
    pub fn completed(result: &Result<ProcessOutput, RunnerError>) -> bool {
        matches!(result, Ok(output) if output.succeeded())
    }
}

impl StageInterpreter for AnalyzeInterpreter {
    fn interpret(&self, result: &Result<ProcessOutput, RunnerError>) -> StageOutcome {
        let output = match result {
            Ok(output) if output.succeeded() => output,
            Ok(output) => {
                return StageOutcome::failure(format!(
                    "Static analysis exited with code {}",
                    exit_code_label(output)
                ))
                .with_raw_output(&output.combined())
            }
            Err(e) => return StageOutcome::failure(format!("Static analysis failed: {e}")),
        };

        let combined = output.combined();
        match self.heuristic.errors_in(&combined) {
            None => StageOutcome::success("Static analysis passed"),
            Some(count) => {
                StageOutcome::failure(format!("Static analysis reported {count} error(s)"))
                    .with_raw_output(&combined)
            }
        }
    }
}

/// Judges the full-build fallback by exit status alone.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuildInterpreter;

impl StageInterpreter for BuildInterpreter {
    fn interpret(&self, result: &Result<ProcessOutput, RunnerError>) -> StageOutcome {
        match result {
            Ok(output) if output.succeeded() => {
                StageOutcome::success(format!("Build succeeded ({})", output.command))
            }
            Ok(output) => StageOutcome::failure(format!(
                "Build failed with exit code {}: {}",
                exit_code_label(output),
                first_line(&output.stderr)
            ))
            .with_raw_output(&output.combined()),
            Err(e) => StageOutcome::failure(format!("Build failed: {e}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Test
// ---------------------------------------------------------------------------

/// Classification of a test run's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestVerdict {
    Passed,
    Failed,
    /// The project has no tests; scored like a failure but reported apart.
    NoTests,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TestInterpreter;

impl TestInterpreter {
    pub fn verdict(output: &ProcessOutput) -> TestVerdict {
        let stdout = &output.stdout;
        if stdout.contains(ALL_TESTS_PASSED) {
            return TestVerdict::Passed;
        }

        let combined = output.combined();
        if NO_TESTS_MARKERS.iter().any(|m| combined.contains(m)) {
            return TestVerdict::NoTests;
        }

        let failed = stdout.contains(SOME_TESTS_FAILED) || FAIL_COUNT.is_match(stdout);
        if PASS_COUNT.is_match(stdout) && !failed {
            TestVerdict::Passed
        } else {
            TestVerdict::Failed
        }
    }
}

impl StageInterpreter for TestInterpreter {
    fn interpret(&self, result: &Result<ProcessOutput, RunnerError>) -> StageOutcome {
        let output = match result {
            Ok(output) => output,
            Err(e) if e.is_timeout() => return StageOutcome::failure(format!("Tests did not finish: {e}")),
            Err(e) => return StageOutcome::failure(format!("Test run could not start: {e}")),
        };

        match Self::verdict(output) {
            TestVerdict::Passed => StageOutcome::success("All tests passed"),
            TestVerdict::NoTests => StageOutcome::failure("No tests found in the project")
                .with_raw_output(&output.combined()),
            TestVerdict::Failed => StageOutcome::failure("Some tests failed")
                .with_raw_output(&output.combined()),
        }
    }
}

fn exit_code_label(output: &ProcessOutput) -> String {
    output
        .exit_code
        .map(|c| c.to_string())
        .unwrap_or_else(|| "signal".to_string())
}

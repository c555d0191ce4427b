//! Subprocess execution with working directory and timeout.

use crate::error::{Result, RunnerError};
use crate::stage::StageConfig;
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::debug;

/// Captured result of a command that ran to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Command line as displayed in messages.
    pub command: String,

    /// Exit code (`None` when terminated by a signal).
    pub exit_code: Option<i32>,

    /// Captured stdout.
    pub stdout: String,

    /// Captured stderr.
    pub stderr: String,

    /// Duration in milliseconds.
    pub duration_ms: u64,
}

impl ProcessOutput {
    /// Whether the command exited with status 0.
    pub fn succeeded(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// stdout followed by stderr, for heuristics that look at both streams.
    pub fn combined(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else if self.stdout.is_empty() {
            self.stderr.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }
}

/// Executes toolchain commands.
pub struct CommandRunner;

impl CommandRunner {
    /// Execute `config.command` in `cwd` and capture its output.
    ///
    /// A non-zero exit is returned as `Ok`; spawn failures and timeouts are
    /// errors. The child is killed if the timeout elapses.
    pub async fn run(config: &StageConfig, cwd: &Path) -> Result<ProcessOutput> {
        let start = Instant::now();

        let (exe, args) = config
            .command
            .split_first()
            .ok_or_else(|| RunnerError::EmptyCommand {
                stage: config.name.clone(),
            })?;
        let command_line = config.display_command();

        debug!(stage = %config.name, command = %command_line, cwd = %cwd.display(), "Spawning command");

        let child = Command::new(exe)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| RunnerError::Spawn {
                command: command_line.clone(),
                source,
            })?;

        let waited = if config.timeout_secs > 0 {
            tokio::time::timeout(
                Duration::from_secs(config.timeout_secs),
                child.wait_with_output(),
            )
            .await
            .map_err(|_| RunnerError::Timeout {
                command: command_line.clone(),
                timeout_secs: config.timeout_secs,
            })?
        } else {
            child.wait_with_output().await
        };
        let output = waited.map_err(|source| RunnerError::Io {
            command: command_line.clone(),
            source,
        })?;

        let duration_ms = start.elapsed().as_millis() as u64;

        Ok(ProcessOutput {
            command: command_line,
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            duration_ms,
        })
    }
}

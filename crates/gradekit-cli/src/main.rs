//! GradeKit - automated grading of Flutter assignment repositories
//!
//! The `gradekit` command runs the grading pipeline from the terminal.
//!
//! ## Commands
//!
//! - `evaluate`: Grade a repository and print the response JSON
//! - `check-url`: Validate a repository URL without cloning it
//! - `collect`: List the source files the quality review would see

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, Level};

use gradekit_core::{
    collect_dart_sources, ErrorKind, EvaluationRequest, EvaluationResponse, GradeError, Grader,
    GraderConfig, RepoLocator,
};

/// Exit code for a malformed or disallowed request.
const EXIT_CLIENT_ERROR: u8 = 2;

/// Exit code for configuration and internal failures.
const EXIT_SERVER_ERROR: u8 = 1;

#[derive(Parser)]
#[command(name = "gradekit")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Automated grading of Flutter assignment repositories", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Grade a repository and print the evaluation as JSON
    Evaluate {
        /// Repository URL (https://github.com/<owner>/<repo>)
        url: String,

        /// Pretty-print the JSON response
        #[arg(long)]
        pretty: bool,

        #[command(flatten)]
        settings: GraderSettings,
    },

    /// Validate a repository URL without cloning it
    CheckUrl {
        /// Repository URL to validate
        url: String,
    },

    /// List the source files the quality review would receive
    Collect {
        /// Project root (default: current directory)
        #[arg(default_value = ".")]
        dir: PathBuf,
    },
}

/// Grader settings. Each flag overrides the matching `GRADEKIT_*` /
/// `OPENAI_API_KEY` environment variable read by [`GraderConfig::from_env`].
#[derive(clap::Args, Debug, Clone, Default)]
struct GraderSettings {
    /// Parent directory for per-run workspaces
    #[arg(long)]
    workspace_root: Option<PathBuf>,

    /// Flutter executable
    #[arg(long)]
    flutter_bin: Option<String>,

    /// Base URL of an OpenAI-compatible API
    #[arg(long)]
    api_base: Option<String>,

    /// Model used for the quality review
    #[arg(long)]
    model: Option<String>,

    /// API key for the quality review endpoint
    #[arg(long)]
    api_key: Option<String>,
}

impl GraderSettings {
    /// Overlay the flags that were given on top of `base`.
    fn apply(self, mut base: GraderConfig) -> GraderConfig {
        if let Some(root) = self.workspace_root {
            base.workspace_root = root;
        }
        if let Some(flutter) = self.flutter_bin {
            base = base.with_flutter_bin(&flutter);
        }
        if let Some(api_base) = self.api_base {
            base.evaluator.api_base = api_base;
        }
        if let Some(model) = self.model {
            base.evaluator.model = model;
        }
        if let Some(key) = self.api_key {
            base.evaluator.api_key = Some(key);
        }
        base
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    gradekit_core::telemetry::init_tracing(cli.json, level);

    let result = match cli.command {
        Commands::Evaluate {
            url,
            pretty,
            settings,
        } => cmd_evaluate(&url, pretty, settings.apply(GraderConfig::from_env())).await,
        Commands::CheckUrl { url } => cmd_check_url(&url),
        Commands::Collect { dir } => cmd_collect(&dir),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(exit_code_for(&e))
        }
    }
}

/// Map a command failure to the process exit code.
fn exit_code_for(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<GradeError>().map(GradeError::kind) {
        Some(ErrorKind::Client) => EXIT_CLIENT_ERROR,
        _ => EXIT_SERVER_ERROR,
    }
}

/// Grade a repository
async fn cmd_evaluate(url: &str, pretty: bool, config: GraderConfig) -> Result<()> {
    let grader = Grader::from_config(config)?;
    let request = EvaluationRequest::new(url);
    let response = grader.evaluate_request(&request).await.inspect_err(|e| {
        error!(error = %e, status = e.status_code(), "Evaluation aborted");
    })?;
    println!("{}", render_response(&response, pretty)?);
    Ok(())
}

fn render_response(response: &EvaluationResponse, pretty: bool) -> Result<String> {
    let rendered = if pretty {
        serde_json::to_string_pretty(response)
    } else {
        serde_json::to_string(response)
    };
    rendered.context("Failed to serialize evaluation response")
}

/// Validate a repository URL
fn cmd_check_url(url: &str) -> Result<()> {
    let config = GraderConfig::default();
    let locator = RepoLocator::parse(url, &config.allowed_hosts)?;

    println!("Repository: {}", locator.url());
    println!("Owner:      {}", locator.owner());
    println!("Name:       {}", locator.name());
    Ok(())
}

/// List collectable source files
fn cmd_collect(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        anyhow::bail!("Not a directory: {}", dir.display());
    }

    let files = collect_dart_sources(dir);
    if files.is_empty() {
        println!("No source files found under {}", dir.join("lib").display());
        return Ok(());
    }

    let total_chars: usize = files.iter().map(|f| f.content.chars().count()).sum();
    for file in &files {
        println!("{:>8}  {}", file.content.chars().count(), file.relative_path);
    }
    println!("\n{} file(s), {} characters", files.len(), total_chars);
    Ok(())
}

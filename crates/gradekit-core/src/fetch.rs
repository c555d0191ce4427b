//! Repository locator validation and shallow cloning.

use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use gradekit_ci::{CommandRunner, RunnerError, StageConfig};
use url::Url;

use crate::domain::error::{GradeError, Result};

/// Hosts accepted by default.
pub const DEFAULT_ALLOWED_HOSTS: &[&str] = &["github.com", "www.github.com"];

/// Reference clone timeout in seconds.
pub const CLONE_TIMEOUT_SECS: u64 = 120;

/// A repository URL that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoLocator {
    url: String,
    owner: String,
    name: String,
}

impl RepoLocator {
    /// Validate `raw` against `allowed_hosts`. Has no side effects.
    ///
    /// The host must equal one allow-list entry exactly (after the URL
    /// parser's normalisation) and the path must name an owner and a
    /// repository.
    pub fn parse<S: AsRef<str>>(raw: &str, allowed_hosts: &[S]) -> Result<Self> {
        let raw = raw.trim();
        let url = Url::parse(raw)
            .map_err(|e| GradeError::InvalidRequest(format!("invalid repository URL '{raw}': {e}")))?;

        if !matches!(url.scheme(), "https" | "http") {
            return Err(GradeError::InvalidRequest(format!(
                "unsupported URL scheme '{}'",
                url.scheme()
            )));
        }

        let host = url.host_str().unwrap_or_default();
        if !allowed_hosts.iter().any(|h| h.as_ref() == host) {
            return Err(GradeError::InvalidRequest(format!(
                "repository host '{host}' is not allowed"
            )));
        }

        let mut segments = url
            .path_segments()
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty());
        let owner = segments.next();
        let name = segments.next().map(|n| n.strip_suffix(".git").unwrap_or(n));
        let (owner, name) = match (owner, name) {
            (Some(o), Some(n)) if !n.is_empty() => (o.to_string(), n.to_string()),
            _ => {
                return Err(GradeError::InvalidRequest(format!(
                    "repository URL '{raw}' must name an owner and a repository"
                )))
            }
        };

        Ok(Self {
            url: raw.to_string(),
            owner,
            name,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Directory name unique to this run: `{owner}-{name}-{millis}-{token}`.
    pub fn workspace_dir_name(&self) -> String {
        let token = uuid::Uuid::new_v4().simple().to_string();
        format!(
            "{}-{}-{}-{}",
            sanitize(&self.owner),
            sanitize(&self.name),
            Utc::now().timestamp_millis(),
            &token[..8]
        )
    }
}

fn sanitize(segment: &str) -> String {
    segment
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Errors produced while fetching a repository.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("git clone failed: {0}")]
    Clone(String),

    #[error(transparent)]
    Runner(#[from] RunnerError),
}

/// Places a repository's contents into a workspace directory.
#[async_trait]
pub trait RepositoryFetcher: Send + Sync {
    async fn fetch(&self, locator: &RepoLocator, dest: &Path) -> std::result::Result<(), FetchError>;
}

/// Shallow `git clone` of the default branch.
#[derive(Debug, Clone)]
pub struct GitFetcher {
    git_bin: String,
    timeout_secs: u64,
}

impl GitFetcher {
    pub fn new(git_bin: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            git_bin: git_bin.into(),
            timeout_secs,
        }
    }

    /// Clone arguments; `target` is resolved against the runner's cwd.
    fn clone_config(&self, locator: &RepoLocator, target: &Path) -> StageConfig {
        StageConfig::custom(
            "clone",
            vec![
                self.git_bin.clone(),
                "clone".to_string(),
                "--depth".to_string(),
                "1".to_string(),
                "--".to_string(),
                locator.url().to_string(),
                target.to_string_lossy().to_string(),
            ],
            self.timeout_secs,
        )
    }
}

impl Default for GitFetcher {
    fn default() -> Self {
        Self::new("git", CLONE_TIMEOUT_SECS)
    }
}

#[async_trait]
impl RepositoryFetcher for GitFetcher {
    async fn fetch(&self, locator: &RepoLocator, dest: &Path) -> std::result::Result<(), FetchError> {
        // The target is relative to `cwd`, so only the final component is passed.
        let (cwd, target) = match (dest.parent(), dest.file_name()) {
            (Some(parent), Some(name)) if !parent.as_os_str().is_empty() => {
                (parent, Path::new(name))
            }
            _ => (Path::new("."), dest),
        };
        let config = self.clone_config(locator, target);
        let output = CommandRunner::run(&config, cwd).await?;

        if !output.succeeded() {
            let stderr = output.stderr.trim();
            return Err(FetchError::Clone(if stderr.is_empty() {
                format!("exit code {:?}", output.exit_code)
            } else {
                stderr.to_string()
            }));
        }
        Ok(())
    }
}

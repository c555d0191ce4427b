//! LLM-driven code-quality evaluation.

pub mod client;
pub mod fakes;
pub mod parse;
pub mod prompt;

use std::sync::Arc;

use tracing::{info, warn};

use crate::collect::CollectedFile;
use crate::domain::error::{GradeError, Result};
use crate::domain::quality::LlmEvaluationResult;

pub use client::{
    CompletionClient, CompletionError, CompletionRequest, EvaluatorConfig, HttpCompletionClient,
};
pub use parse::{parse_evaluation, ParseSource, ParsedEvaluation};
pub use prompt::{build_code_blob, build_prompt};

/// Scores collected source files through a [`CompletionClient`].
#[derive(Clone)]
pub struct LlmEvaluator {
    client: Arc<dyn CompletionClient>,
    temperature: f32,
    max_tokens: u32,
}

impl LlmEvaluator {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self {
            client,
            temperature: client::DEFAULT_TEMPERATURE,
            max_tokens: client::DEFAULT_MAX_TOKENS,
        }
    }

    /// Evaluator backed by the HTTP endpoint described by `config`.
    pub fn from_config(config: EvaluatorConfig) -> Result<Self> {
        let (temperature, max_tokens) = (config.temperature, config.max_tokens);
        let client = HttpCompletionClient::new(config)
            .map_err(|e| GradeError::Configuration(format!("cannot build HTTP client: {e}")))?;
        Ok(Self::new(Arc::new(client)).with_generation(temperature, max_tokens))
    }

    pub fn with_generation(mut self, temperature: f32, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    /// Score `files` out of `max_score`.
    ///
    /// Endpoint and parsing failures degrade to a zero-score result; only a
    /// missing credential is returned as an error.
    pub async fn evaluate(
        &self,
        files: &[CollectedFile],
        max_score: u32,
    ) -> Result<LlmEvaluationResult> {
        let request = CompletionRequest {
            prompt: build_prompt(&build_code_blob(files), max_score),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        match self.client.complete(&request).await {
            Ok(raw) => {
                let parsed = parse_evaluation(&raw, max_score);
                info!(
                    score = parsed.result.score,
                    max_score = max_score,
                    source = ?parsed.source,
                    "Quality evaluation parsed"
                );
                Ok(parsed.result)
            }
            Err(CompletionError::MissingCredential) => Err(GradeError::Configuration(
                CompletionError::MissingCredential.to_string(),
            )),
            Err(e) => {
                warn!(error = %e, "Quality evaluation unavailable");
                Ok(LlmEvaluationResult::unavailable(&e.to_string()))
            }
        }
    }
}

//! In-memory completion clients (testing only).

use std::sync::Mutex;

use async_trait::async_trait;

use super::client::{CompletionClient, CompletionError, CompletionRequest};

/// Returns the same reply to every request and records the prompts it saw.
#[derive(Debug, Default)]
pub struct StaticCompletionClient {
    reply: String,
    prompts: Mutex<Vec<String>>,
}

impl StaticCompletionClient {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Prompts received so far, in order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionClient for StaticCompletionClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        self.prompts.lock().unwrap().push(request.prompt.clone());
        Ok(self.reply.clone())
    }
}

/// Fails every request with an error produced by `make_error`.
pub struct FailingCompletionClient {
    make_error: fn() -> CompletionError,
}

impl FailingCompletionClient {
    pub fn new(make_error: fn() -> CompletionError) -> Self {
        Self { make_error }
    }

    /// Simulates an unreachable endpoint.
    pub fn network() -> Self {
        Self::new(|| CompletionError::Transport("connection refused".to_string()))
    }

    /// Simulates a deployment without a credential.
    pub fn missing_credential() -> Self {
        Self::new(|| CompletionError::MissingCredential)
    }
}

#[async_trait]
impl CompletionClient for FailingCompletionClient {
    async fn complete(&self, _request: &CompletionRequest) -> Result<String, CompletionError> {
        Err((self.make_error)())
    }
}

// src/summarize/completion.rs
//! Completion capability: one prompt in, one text out.

use std::sync::Arc;

use async_trait::async_trait;

use super::openai::OpenAiCompletion;
use crate::config::ai::CompletionConfig;
use crate::error::{CompletionError, ConfigError};

#[async_trait]
pub trait Completion: Send + Sync {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, CompletionError>;
    /// Provider name for diagnostics.
    fn name(&self) -> &'static str;
}

pub type DynCompletion = Arc<dyn Completion>;

/// Deterministic provider for tests/local runs.
#[derive(Debug, Clone)]
pub struct MockCompletion {
    pub fixed: String,
}

impl MockCompletion {
    pub fn new(fixed: impl Into<String>) -> Self {
        Self {
            fixed: fixed.into(),
        }
    }
}

#[async_trait]
impl Completion for MockCompletion {
    async fn complete(&self, _prompt: &str, _max_tokens: u32) -> Result<String, CompletionError> {
        Ok(self.fixed.clone())
    }
    fn name(&self) -> &'static str {
        "mock"
    }
}

/// Factory: build the completion capability from config + environment.
///
/// * If `AI_TEST_MODE=mock`, returns a deterministic mock provider.
/// * Otherwise builds the OpenAI-compatible provider; the API key must resolve.
pub fn build_completion(cfg: &CompletionConfig) -> Result<DynCompletion, ConfigError> {
    if std::env::var("AI_TEST_MODE")
        .map(|v| v == "mock")
        .unwrap_or(false)
    {
        return Ok(Arc::new(MockCompletion::new("Summary (mock)")));
    }
    let key = cfg.resolve_api_key()?;
    Ok(Arc::new(OpenAiCompletion::new(
        cfg.base_url.clone(),
        key,
        cfg.model.clone(),
    )))
}

// src/summarize/mod.rs
//! Summary client: turns a batch of texts into a batch of summaries.
//!
//! One completion request per text. Results keep input length and order, and
//! a failing item (timeout, rate limit, malformed output) only fails itself.

pub mod completion;
pub mod openai;

use std::time::Duration;

use futures::future::join_all;

use crate::error::SummarizeError;
use crate::post::{Post, SummaryBatch};
pub use completion::{build_completion, Completion, DynCompletion, MockCompletion};
pub use openai::OpenAiCompletion;

pub const DEFAULT_MAX_TOKENS: u32 = 150;
pub const DEFAULT_CONCURRENCY: usize = 4;

pub fn summary_prompt(text: &str) -> String {
    format!("Summarize this important post: {text}")
}

#[derive(Clone)]
pub struct SummaryClient {
    completion: DynCompletion,
    max_tokens: u32,
    timeout: Duration,
    concurrency: usize,
}

impl SummaryClient {
    pub fn new(completion: DynCompletion) -> Self {
        Self {
            completion,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: Duration::from_secs(30),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Concurrent requests per chunk; 0 is treated as 1.
    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }

    async fn summarize_one(&self, text: &str) -> Result<String, SummarizeError> {
        let prompt = summary_prompt(text);
        let out = tokio::time::timeout(
            self.timeout,
            self.completion.complete(&prompt, self.max_tokens),
        )
        .await
        .map_err(|_| SummarizeError::Timeout(self.timeout))??;

        let trimmed = out.trim();
        if trimmed.is_empty() {
            return Err(SummarizeError::Malformed);
        }
        Ok(trimmed.to_string())
    }

    /// Summaries for `texts`, same length and order.
    pub async fn summarize<S: AsRef<str>>(&self, texts: &[S]) -> Vec<Result<String, SummarizeError>> {
        let mut results = Vec::with_capacity(texts.len());
        // Chunks keep fan-out bounded; join_all keeps order within a chunk.
        for chunk in texts.chunks(self.concurrency) {
            let futures: Vec<_> = chunk
                .iter()
                .map(|t| self.summarize_one(t.as_ref()))
                .collect();
            results.extend(join_all(futures).await);
        }
        results
    }

    /// Summaries zipped onto their posts.
    pub async fn summarize_posts(&self, posts: Vec<Post>) -> SummaryBatch {
        let texts: Vec<&str> = posts.iter().map(|p| p.text.as_str()).collect();
        let results = self.summarize(&texts).await;
        posts.into_iter().zip(results).collect()
    }
}

// src/error.rs
//! Error taxonomy for the pipeline.
//!
//! Run-level errors (`RunError`) abort a single run and are reported; the
//! next scheduled trigger is the only retry. Item-level errors
//! (`SummarizeError`, `PersistError`, `NotifyError`) only affect one post.

use std::time::Duration;

use thiserror::Error;

/// Failure inside a store adapter.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store io: {0}")]
    Io(#[from] std::io::Error),
    #[error("store document is corrupt: {0}")]
    Corrupt(String),
    #[error("no post with id {0}")]
    NotFound(String),
}

/// Fetching candidate posts failed. Aborts the run.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("store query failed: {0}")]
    Store(#[from] StoreError),
    #[error("store query timed out after {0:?}")]
    Timeout(Duration),
}

/// Failure of a single completion request.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("completion API error {status}: {body}")]
    Http { status: u16, body: String },
    #[error("completion API rate limited")]
    RateLimited,
    #[error("completion request failed: {0}")]
    Transport(String),
    #[error("malformed completion response: {0}")]
    Malformed(String),
    #[error("missing completion credential")]
    MissingCredential,
}

/// Per-item summarization failure. Never aborts the batch.
#[derive(Debug, Error)]
pub enum SummarizeError {
    #[error(transparent)]
    Completion(#[from] CompletionError),
    #[error("summary request timed out after {0:?}")]
    Timeout(Duration),
    #[error("completion returned an empty summary")]
    Malformed,
}

/// Per-item persistence failure. Blocks the notification for that post.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("post {0} not found")]
    NotFound(String),
    #[error("summary write failed: {0}")]
    Store(StoreError),
    #[error("summary write timed out after {0:?}")]
    Timeout(Duration),
}

impl From<StoreError> for PersistError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => PersistError::NotFound(id),
            other => PersistError::Store(other),
        }
    }
}

/// Per-item notification failure. Logged only; persisted state is untouched.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("gateway error {status}: {body}")]
    Http { status: u16, body: String },
    #[error("gateway request failed: {0}")]
    Transport(String),
    #[error("gateway send timed out after {0:?}")]
    Timeout(Duration),
}

/// Reasons a whole run was aborted.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("completion capability unavailable: all {failed} summaries failed")]
    CompletionUnavailable { failed: usize },
    #[error("run cancelled during {0}")]
    Cancelled(&'static str),
    #[error("a pipeline run is already in flight")]
    AlreadyRunning,
}

/// Startup configuration problems.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required env var {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
    #[error("config file {path}: {reason}")]
    File { path: String, reason: String },
}

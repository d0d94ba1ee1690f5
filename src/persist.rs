// src/persist.rs
//! Persistence adapter: the only write path from the pipeline into the store.

use std::sync::Arc;
use std::time::Duration;

use crate::error::PersistError;
use crate::store::PostStore;

/// Writes summaries keyed by post id, bounded by a timeout.
#[derive(Clone)]
pub struct SummaryPersister {
    store: Arc<dyn PostStore>,
    timeout: Duration,
}

impl SummaryPersister {
    pub fn new(store: Arc<dyn PostStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Atomic, idempotent `summary` update. Re-applying the same value is Ok.
    pub async fn persist_summary(&self, post_id: &str, summary: &str) -> Result<(), PersistError> {
        match tokio::time::timeout(self.timeout, self.store.update_summary(post_id, summary)).await
        {
            Ok(res) => res.map_err(PersistError::from),
            Err(_) => Err(PersistError::Timeout(self.timeout)),
        }
    }
}

// src/store/memory.rs
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::PostStore;
use crate::error::StoreError;
use crate::post::{Post, PostFilter};

/// In-process store. Insertion order is preserved for `find`.
#[derive(Clone, Default)]
pub struct MemoryStore {
    posts: Arc<Mutex<Vec<Post>>>,
    writes: Arc<AtomicUsize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_posts(posts: Vec<Post>) -> Self {
        Self {
            posts: Arc::new(Mutex::new(posts)),
            writes: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn get(&self, id: &str) -> Option<Post> {
        self.lock().iter().find(|p| p.id == id).cloned()
    }

    pub fn all(&self) -> Vec<Post> {
        self.lock().clone()
    }

    /// Number of updates that actually changed a document.
    pub fn effective_writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Post>> {
        // A panic while holding the lock cannot leave a Post half-written.
        self.posts.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn find(&self, filter: &PostFilter) -> Result<Vec<Post>, StoreError> {
        Ok(self
            .lock()
            .iter()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect())
    }

    async fn update_summary(&self, id: &str, summary: &str) -> Result<(), StoreError> {
        let mut posts = self.lock();
        let post = posts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        if post.summary.as_deref() != Some(summary) {
            post.summary = Some(summary.to_string());
            self.writes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    #[tokio::test]
    async fn find_respects_filter_and_order() {
        let t0 = Utc.with_ymd_and_hms(2025, 9, 6, 9, 0, 0).unwrap();
        let store = MemoryStore::with_posts(vec![
            Post::new("old", "x", t0 - Duration::hours(2)),
            Post::new("a", "x", t0),
            Post::new("b", "x", t0 + Duration::minutes(5)),
            Post::new("future", "x", t0 + Duration::hours(2)),
        ]);
        let filter = PostFilter {
            since: t0,
            until: Some(t0 + Duration::hours(1)),
        };
        let ids: Vec<String> = store
            .find(&filter)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn update_is_idempotent() {
        let store = MemoryStore::with_posts(vec![Post::new("p1", "x", Utc::now())]);
        store.update_summary("p1", "sum").await.unwrap();
        let first = store.get("p1");
        store.update_summary("p1", "sum").await.unwrap();
        assert_eq!(store.get("p1"), first);
        assert_eq!(store.effective_writes(), 1);
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let store = MemoryStore::new();
        let err = store.update_summary("nope", "s").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(id) if id == "nope"));
    }
}

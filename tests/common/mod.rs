// tests/common/mod.rs
// Shared capability doubles for integration tests.
#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Notify;

use post_summarizer::error::{CompletionError, NotifyError, StoreError};
use post_summarizer::notify::Notifier;
use post_summarizer::post::{Post, PostFilter};
use post_summarizer::store::{MemoryStore, PostStore};
use post_summarizer::summarize::Completion;
use post_summarizer::{KeywordFilter, Pipeline, PipelineCfg};

/// Records every message; fails for channel ids in `fail_channels`
/// or when the text contains `fail_marker`.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(String, String)>>,
    /// Tokio clock reading at each successful send.
    pub sent_at: Mutex<Vec<tokio::time::Instant>>,
    pub fail_marker: Option<String>,
}

impl RecordingNotifier {
    pub fn failing_on(marker: &str) -> Self {
        Self {
            fail_marker: Some(marker.to_string()),
            ..Default::default()
        }
    }

    pub fn messages(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn send_times(&self) -> Vec<tokio::time::Instant> {
        self.sent_at.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, channel_id: &str, text: &str) -> Result<(), NotifyError> {
        if let Some(m) = &self.fail_marker {
            if text.contains(m.as_str()) {
                return Err(NotifyError::Http {
                    status: 500,
                    body: "boom".into(),
                });
            }
        }
        self.sent
            .lock()
            .unwrap()
            .push((channel_id.to_string(), text.to_string()));
        self.sent_at.lock().unwrap().push(tokio::time::Instant::now());
        Ok(())
    }
    fn name(&self) -> &'static str {
        "recording"
    }
}

/// Completion that returns a fixed summary, fails for prompts containing
/// "FAIL", stalls for an hour on "HANG", and counts calls. Optionally blocks until `gate` is notified.
pub struct CountingCompletion {
    pub reply: String,
    pub calls: AtomicUsize,
    pub gate: Option<Arc<Notify>>,
}

impl CountingCompletion {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            calls: AtomicUsize::new(0),
            gate: None,
        }
    }

    pub fn gated(reply: &str, gate: Arc<Notify>) -> Self {
        Self {
            reply: reply.to_string(),
            calls: AtomicUsize::new(0),
            gate: Some(gate),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Completion for CountingCompletion {
    async fn complete(&self, prompt: &str, _max_tokens: u32) -> Result<String, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(g) = &self.gate {
            g.notified().await;
        }
        if prompt.contains("HANG") {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if prompt.contains("FAIL") {
            return Err(CompletionError::Http {
                status: 503,
                body: "unavailable".into(),
            });
        }
        Ok(self.reply.clone())
    }
    fn name(&self) -> &'static str {
        "counting"
    }
}

/// Wraps a MemoryStore; updates for ids in `reject` fail, `find` can be
/// broken or stalled, and updates for ids in `slow` take `update_delay`.
pub struct FlakyStore {
    pub inner: MemoryStore,
    pub reject: HashSet<String>,
    pub broken_find: bool,
    pub find_delay: Option<Duration>,
    pub slow: HashSet<String>,
    pub update_delay: Duration,
    pub updates: AtomicUsize,
}

impl FlakyStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            reject: HashSet::new(),
            broken_find: false,
            find_delay: None,
            slow: HashSet::new(),
            update_delay: Duration::ZERO,
            updates: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl PostStore for FlakyStore {
    async fn find(&self, filter: &PostFilter) -> Result<Vec<Post>, StoreError> {
        if let Some(d) = self.find_delay {
            tokio::time::sleep(d).await;
        }
        if self.broken_find {
            return Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "store down",
            )));
        }
        self.inner.find(filter).await
    }

    async fn update_summary(&self, id: &str, summary: &str) -> Result<(), StoreError> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        if self.slow.contains(id) {
            tokio::time::sleep(self.update_delay).await;
        }
        if self.reject.contains(id) {
            return Err(StoreError::Io(std::io::Error::other("write refused")));
        }
        self.inner.update_summary(id, summary).await
    }

    fn name(&self) -> &'static str {
        "flaky"
    }
}

pub const CHANNEL: &str = "424242";

pub fn test_cfg() -> PipelineCfg {
    PipelineCfg {
        interval: Duration::from_secs(3600),
        lookback: Duration::from_secs(3600),
        concurrency: 2,
        ..Default::default()
    }
}

pub fn post_at(id: &str, text: &str, ts: DateTime<Utc>) -> Post {
    Post::new(id, text, ts)
}

pub fn pipeline(
    store: Arc<dyn PostStore>,
    completion: Arc<dyn Completion>,
    notifier: Arc<dyn Notifier>,
) -> Pipeline {
    pipeline_with(store, completion, notifier, test_cfg())
}

pub fn pipeline_with(
    store: Arc<dyn PostStore>,
    completion: Arc<dyn Completion>,
    notifier: Arc<dyn Notifier>,
    cfg: PipelineCfg,
) -> Pipeline {
    Pipeline::new(
        store,
        Arc::new(KeywordFilter::default()),
        completion,
        notifier,
        CHANNEL,
        cfg,
    )
}

// src/pipeline/mod.rs
//! One pipeline run: fetch → filter → summarize → persist → notify.
//!
//! States: Idle → Fetching → Filtering → Summarizing → Persisting → Notifying → Idle.
//! Persisting and Notifying run per post as one unit; units for different
//! posts run concurrently in chunks. Shutdown is observed at every state
//! boundary up to the start of the units. Item failures are logged and
//! counted; only a fetch failure, a fully failed summary batch, or
//! cancellation aborts the run.

pub mod scheduler;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use futures::future::join_all;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use once_cell::sync::OnceCell;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::{FetchError, RunError};
use crate::notify::{format_summary_message, notify, Notifier};
use crate::persist::SummaryPersister;
use crate::post::{Post, Window};
use crate::store::PostStore;
use crate::summarize::{DynCompletion, SummaryClient, DEFAULT_MAX_TOKENS};
use crate::triage::ImportanceFilter;

pub use scheduler::spawn_scheduler;

/// Knobs for the recurring pipeline.
#[derive(Debug, Clone)]
pub struct PipelineCfg {
    pub interval: Duration,
    /// Width of the query window. Wider than `interval` so a post that
    /// failed in one run is still seen by the next.
    pub lookback: Duration,
    pub concurrency: usize,
    /// Output budget per summary.
    pub max_tokens: u32,
    pub fetch_timeout: Duration,
    pub completion_timeout: Duration,
    pub persist_timeout: Duration,
    pub notify_timeout: Duration,
}

impl Default for PipelineCfg {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3600),
            lookback: Duration::from_secs(7200),
            concurrency: 4,
            max_tokens: DEFAULT_MAX_TOKENS,
            fetch_timeout: Duration::from_secs(10),
            completion_timeout: Duration::from_secs(30),
            persist_timeout: Duration::from_secs(10),
            notify_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunState {
    Idle,
    Fetching,
    Filtering,
    Summarizing,
    Persisting,
    Notifying,
}

impl RunState {
    pub fn as_str(self) -> &'static str {
        match self {
            RunState::Idle => "idle",
            RunState::Fetching => "fetching",
            RunState::Filtering => "filtering",
            RunState::Summarizing => "summarizing",
            RunState::Persisting => "persisting",
            RunState::Notifying => "notifying",
        }
    }
}

/// Counters for one completed run.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub window: Window,
    pub fetched: usize,
    /// Posts in the window that already carry a summary.
    pub already_summarized: usize,
    pub important: usize,
    pub summarized: usize,
    pub summarize_failed: usize,
    pub persisted: usize,
    pub persist_failed: usize,
    pub notified: usize,
    pub notify_failed: usize,
}

impl RunReport {
    fn new(started_at: DateTime<Utc>, window: Window) -> Self {
        Self {
            started_at,
            window,
            fetched: 0,
            already_summarized: 0,
            important: 0,
            summarized: 0,
            summarize_failed: 0,
            persisted: 0,
            persist_failed: 0,
            notified: 0,
            notify_failed: 0,
        }
    }
}

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("pipeline_runs_total", "Pipeline runs that completed.");
        describe_counter!("pipeline_run_aborts_total", "Pipeline runs aborted.");
        describe_counter!("pipeline_posts_fetched_total", "Posts returned by the window query.");
        describe_counter!("pipeline_posts_important_total", "Posts that passed triage.");
        describe_counter!("pipeline_summaries_total", "Summaries produced.");
        describe_counter!("pipeline_summary_errors_total", "Per-post summary failures.");
        describe_counter!("pipeline_persist_errors_total", "Per-post summary write failures.");
        describe_counter!("pipeline_notifications_total", "Announcements sent.");
        describe_counter!("pipeline_notify_errors_total", "Announcement send failures.");
        describe_gauge!("pipeline_last_run_ts", "Unix ts when the pipeline last finished a run.");
        describe_histogram!("pipeline_run_ms", "Pipeline run duration in milliseconds.");
    });
}

/// Releases the in-flight flag when the run ends, however it ends.
struct RunGuard<'a>(&'a AtomicBool);

impl<'a> RunGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunGuard(flag))
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Outcome of one persist -> notify unit.
enum Delivery {
    NotPersisted,
    PersistedOnly,
    Announced,
}

pub struct Pipeline {
    store: Arc<dyn PostStore>,
    filter: Arc<dyn ImportanceFilter>,
    summarizer: SummaryClient,
    persister: SummaryPersister,
    notifier: Arc<dyn Notifier>,
    channel_id: String,
    cfg: PipelineCfg,
    in_flight: AtomicBool,
    last_report: RwLock<Option<RunReport>>,
}

impl Pipeline {
    pub fn new(
        store: Arc<dyn PostStore>,
        filter: Arc<dyn ImportanceFilter>,
        completion: DynCompletion,
        notifier: Arc<dyn Notifier>,
        channel_id: impl Into<String>,
        cfg: PipelineCfg,
    ) -> Self {
        let summarizer = SummaryClient::new(completion)
            .with_max_tokens(cfg.max_tokens)
            .with_timeout(cfg.completion_timeout)
            .with_concurrency(cfg.concurrency);
        let persister = SummaryPersister::new(store.clone(), cfg.persist_timeout);
        Self {
            store,
            filter,
            summarizer,
            persister,
            notifier,
            channel_id: channel_id.into(),
            cfg,
            in_flight: AtomicBool::new(false),
            last_report: RwLock::new(None),
        }
    }

    pub fn cfg(&self) -> &PipelineCfg {
        &self.cfg
    }

    pub fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn last_report(&self) -> Option<RunReport> {
        self.last_report
            .read()
            .map(|g| g.clone())
            .unwrap_or_else(|e| e.into_inner().clone())
    }

    /// Run once for `now` with no shutdown signal.
    pub async fn run_once(&self, now: DateTime<Utc>) -> Result<RunReport, RunError> {
        let (_tx, rx) = watch::channel(false);
        self.run_until(now, &rx).await
    }

    /// Run once for `now`; stops at the next state boundary once `shutdown` is true.
    /// A call while another run is in flight returns `RunError::AlreadyRunning`.
    pub async fn run_until(
        &self,
        now: DateTime<Utc>,
        shutdown: &watch::Receiver<bool>,
    ) -> Result<RunReport, RunError> {
        let _guard = RunGuard::acquire(&self.in_flight).ok_or(RunError::AlreadyRunning)?;
        ensure_metrics_described();

        let t0 = Instant::now();
        let res = self.execute(now, shutdown).await;
        histogram!("pipeline_run_ms").record(t0.elapsed().as_secs_f64() * 1000.0);

        match &res {
            Ok(report) => {
                counter!("pipeline_runs_total").increment(1);
                gauge!("pipeline_last_run_ts").set(Utc::now().timestamp() as f64);
                info!(
                    target: "pipeline",
                    fetched = report.fetched,
                    already_summarized = report.already_summarized,
                    important = report.important,
                    summarized = report.summarized,
                    summarize_failed = report.summarize_failed,
                    persisted = report.persisted,
                    persist_failed = report.persist_failed,
                    notified = report.notified,
                    notify_failed = report.notify_failed,
                    "pipeline run finished"
                );
                if let Ok(mut g) = self.last_report.write() {
                    *g = Some(report.clone());
                }
            }
            Err(e) => {
                counter!("pipeline_run_aborts_total").increment(1);
                warn!(target: "pipeline", error = %e, "pipeline run aborted");
            }
        }
        res
    }

    fn enter(&self, state: RunState, shutdown: &watch::Receiver<bool>) -> Result<(), RunError> {
        if *shutdown.borrow() {
            return Err(RunError::Cancelled(state.as_str()));
        }
        debug!(target: "pipeline", state = state.as_str(), "state transition");
        Ok(())
    }

    fn idle(&self) {
        debug!(target: "pipeline", state = RunState::Idle.as_str(), "state transition");
    }

    async fn execute(
        &self,
        now: DateTime<Utc>,
        shutdown: &watch::Receiver<bool>,
    ) -> Result<RunReport, RunError> {
        let lookback = ChronoDuration::from_std(self.cfg.lookback).unwrap_or(ChronoDuration::MAX);
        let window = Window::ending_at(now, lookback);
        let mut report = RunReport::new(now, window);

        self.enter(RunState::Fetching, shutdown)?;
        let posts = self.fetch(&window).await?;
        report.fetched = posts.len();
        counter!("pipeline_posts_fetched_total").increment(posts.len() as u64);

        self.enter(RunState::Filtering, shutdown)?;
        // windows overlap when lookback > interval; a stored summary marks a handled post
        let (done, pending): (Vec<Post>, Vec<Post>) =
            posts.into_iter().partition(Post::is_summarized);
        report.already_summarized = done.len();
        let important: Vec<Post> = pending
            .into_iter()
            .filter(|p| self.filter.is_important(p))
            .collect();
        report.important = important.len();
        counter!("pipeline_posts_important_total").increment(important.len() as u64);
        if important.is_empty() {
            debug!(target: "pipeline", skipped = report.already_summarized, "no pending important posts in window");
            self.idle();
            return Ok(report);
        }

        self.enter(RunState::Summarizing, shutdown)?;
        let batch = self.summarizer.summarize_posts(important).await;
        let mut summarized = Vec::with_capacity(batch.len());
        for (post, res) in batch {
            match res {
                Ok(summary) => summarized.push((post, summary)),
                Err(e) => {
                    report.summarize_failed += 1;
                    warn!(target: "pipeline", post_id = %post.id, error = %e, "summary failed; post skipped this run");
                }
            }
        }
        report.summarized = summarized.len();
        counter!("pipeline_summaries_total").increment(summarized.len() as u64);
        counter!("pipeline_summary_errors_total").increment(report.summarize_failed as u64);
        if summarized.is_empty() {
            return Err(RunError::CompletionUnavailable {
                failed: report.summarize_failed,
            });
        }

        // started units run to completion; shutdown is only observed before them
        self.enter(RunState::Persisting, shutdown)?;
        self.deliver_all(&summarized, &mut report).await;

        self.idle();
        Ok(report)
    }

    async fn fetch(&self, window: &Window) -> Result<Vec<Post>, FetchError> {
        let filter = window.filter();
        let posts = tokio::time::timeout(self.cfg.fetch_timeout, self.store.find(&filter))
            .await
            .map_err(|_| FetchError::Timeout(self.cfg.fetch_timeout))??;
        // adapters may only honour the lower bound
        Ok(posts
            .into_iter()
            .filter(|p| window.contains(p.timestamp))
            .collect())
    }

    /// One `persist -> notify` unit. A post is announced only after its
    /// summary is stored.
    async fn deliver(&self, post: &Post, summary: &str) -> Delivery {
        if let Err(e) = self.persister.persist_summary(&post.id, summary).await {
            warn!(target: "pipeline", post_id = %post.id, error = %e, "summary not persisted; notification skipped");
            return Delivery::NotPersisted;
        }
        debug!(target: "pipeline", post_id = %post.id, state = RunState::Notifying.as_str(), "state transition");
        let message = format_summary_message(summary);
        match notify(
            self.notifier.as_ref(),
            &self.channel_id,
            &message,
            self.cfg.notify_timeout,
        )
        .await
        {
            Ok(()) => Delivery::Announced,
            Err(e) => {
                warn!(target: "pipeline", post_id = %post.id, error = %e, "announcement failed; summary stays persisted");
                Delivery::PersistedOnly
            }
        }
    }

    async fn deliver_all(&self, items: &[(Post, String)], report: &mut RunReport) {
        for chunk in items.chunks(self.cfg.concurrency.max(1)) {
            let units: Vec<_> = chunk
                .iter()
                .map(|(post, summary)| self.deliver(post, summary))
                .collect();
            for outcome in join_all(units).await {
                match outcome {
                    Delivery::NotPersisted => {
                        report.persist_failed += 1;
                        counter!("pipeline_persist_errors_total").increment(1);
                    }
                    Delivery::PersistedOnly => {
                        report.persisted += 1;
                        report.notify_failed += 1;
                        counter!("pipeline_notify_errors_total").increment(1);
                    }
                    Delivery::Announced => {
                        report.persisted += 1;
                        report.notified += 1;
                        counter!("pipeline_notifications_total").increment(1);
                    }
                }
            }
        }
    }
}

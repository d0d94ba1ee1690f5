// src/post.rs
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SummarizeError;

/// One ingested social-media post.
///
/// `id`, `text` and `timestamp` are assigned upstream and never changed here;
/// only `summary` is written by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Post {
    pub id: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl Post {
    pub fn new(id: impl Into<String>, text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            timestamp,
            summary: None,
        }
    }

    /// A post with a stored summary has already been handled by a run.
    pub fn is_summarized(&self) -> bool {
        self.summary.is_some()
    }
}

/// Half-open interval `[start, end)` used to select candidates for one run.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Window {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Window {
    /// Window of width `lookback` ending (exclusively) at `now`.
    /// A non-positive lookback yields an empty window; a lookback reaching
    /// past the representable range starts at `DateTime::<Utc>::MIN_UTC`.
    pub fn ending_at(now: DateTime<Utc>, lookback: ChronoDuration) -> Self {
        let lookback = lookback.max(ChronoDuration::zero());
        Self {
            start: now
                .checked_sub_signed(lookback)
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
            end: now,
        }
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start <= ts && ts < self.end
    }

    pub fn filter(&self) -> PostFilter {
        PostFilter {
            since: self.start,
            until: Some(self.end),
        }
    }
}

/// Store query shape: `timestamp >= since` and, when set, `timestamp < until`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostFilter {
    pub since: DateTime<Utc>,
    pub until: Option<DateTime<Utc>>,
}

impl PostFilter {
    pub fn matches(&self, post: &Post) -> bool {
        post.timestamp >= self.since && self.until.map_or(true, |u| post.timestamp < u)
    }
}

/// Summaries zipped back onto their source posts, in input order.
pub type SummaryBatch = Vec<(Post, Result<String, SummarizeError>)>;

// src/lib.rs
// Public library surface for the service binary and integration tests.

pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod normalize;
pub mod persist;
pub mod pipeline;
pub mod post;
pub mod store;
pub mod summarize;
pub mod triage;

// Notifications & chat gateway
pub mod notify;

// ---- Re-exports for stable public API ----
pub use crate::normalize::normalize;
pub use crate::pipeline::{spawn_scheduler, Pipeline, PipelineCfg, RunReport};
pub use crate::post::{Post, Window};
pub use crate::triage::{is_important, ImportanceFilter, KeywordFilter};

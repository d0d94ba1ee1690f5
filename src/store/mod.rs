// src/store/mod.rs
//! Document store capability over `Post` records.

pub mod json_file;
pub mod memory;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::post::{Post, PostFilter};

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

#[async_trait]
pub trait PostStore: Send + Sync {
    /// All posts matching `filter`, in store order.
    async fn find(&self, filter: &PostFilter) -> Result<Vec<Post>, StoreError>;

    /// Atomic point update of `summary` on the post identified by `id`.
    /// Writing a value that is already present must succeed without a change.
    async fn update_summary(&self, id: &str, summary: &str) -> Result<(), StoreError>;

    fn name(&self) -> &'static str;
}

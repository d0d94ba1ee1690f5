// src/store/json_file.rs
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tokio::fs;
use tokio::sync::Mutex;

use super::PostStore;
use crate::error::StoreError;
use crate::post::{Post, PostFilter};

/// Store backed by one JSON file holding an array of post documents.
///
/// Documents may carry extra keys written by the ingestion side; they are
/// preserved on rewrite. Writers are serialized through `write_lock` and
/// replace the file via temp file + rename, so readers never observe a
/// partially written document set. A missing file is an empty collection.
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_docs(&self) -> Result<Vec<Value>, StoreError> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(s) => s,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::Io(e)),
        };
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str::<Vec<Value>>(&raw)
            .map_err(|e| StoreError::Corrupt(format!("{}: {e}", self.path.display())))
    }

    async fn write_docs(&self, docs: &[Value]) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).await?;
        }
        let body = serde_json::to_vec_pretty(docs)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, body).await?;
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl PostStore for JsonFileStore {
    async fn find(&self, filter: &PostFilter) -> Result<Vec<Post>, StoreError> {
        let docs = self.read_docs().await?;
        let mut out = Vec::new();
        for doc in docs {
            match serde_json::from_value::<Post>(doc) {
                Ok(p) if filter.matches(&p) => out.push(p),
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(store = "json_file", error = %e, "skipping malformed post document");
                }
            }
        }
        Ok(out)
    }

    async fn update_summary(&self, id: &str, summary: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut docs = self.read_docs().await?;

        let doc = docs
            .iter_mut()
            .find(|d| d.get("id").and_then(Value::as_str) == Some(id))
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        if doc.get("summary").and_then(Value::as_str) == Some(summary) {
            return Ok(());
        }
        let obj = doc
            .as_object_mut()
            .ok_or_else(|| StoreError::Corrupt(format!("post {id} is not an object")))?;
        obj.insert("summary".to_string(), Value::String(summary.to_string()));

        self.write_docs(&docs).await
    }

    fn name(&self) -> &'static str {
        "json_file"
    }
}

// tests/json_store_e2e.rs
mod common;

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use serde_json::Value;

use common::*;
use post_summarizer::store::JsonFileStore;

#[tokio::test]
async fn run_writes_summary_into_document_file() {
    let now = Utc.with_ymd_and_hms(2025, 9, 6, 12, 0, 0).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("posts.json");
    let docs = serde_json::json!([
        {"id": "p1", "text": "Big announcement today", "timestamp": (now - Duration::minutes(5)).to_rfc3339(), "source": "x"},
        {"id": "p2", "text": "cat pictures", "timestamp": (now - Duration::minutes(4)).to_rfc3339()},
        {"id": "p3", "text": "old update", "timestamp": (now - Duration::days(1)).to_rfc3339()}
    ]);
    std::fs::write(&path, serde_json::to_string(&docs).unwrap()).unwrap();

    let notifier = Arc::new(RecordingNotifier::default());
    let p = pipeline(
        Arc::new(JsonFileStore::new(&path)),
        Arc::new(CountingCompletion::new("Short summary.")),
        notifier.clone(),
    );

    let report = p.run_once(now).await.unwrap();
    assert_eq!(report.fetched, 2);
    assert_eq!(report.important, 1);

    let after: Vec<Value> =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(after[0]["summary"], "Short summary.");
    assert_eq!(after[0]["source"], "x");
    assert!(after[1].get("summary").is_none());
    assert!(after[2].get("summary").is_none());
    assert_eq!(notifier.messages().len(), 1);
}

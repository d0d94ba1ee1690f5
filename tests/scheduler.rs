// tests/scheduler.rs
mod common;

use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use tokio::sync::watch;

use common::*;
use post_summarizer::spawn_scheduler;
use post_summarizer::store::MemoryStore;

async fn wait_for<F: Fn() -> bool>(cond: F) -> bool {
    for _ in 0..200 {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cond()
}

#[tokio::test]
async fn first_run_fires_immediately_and_shutdown_stops_the_loop() {
    let store = MemoryStore::with_posts(vec![post_at(
        "p1",
        "Big announcement today",
        Utc::now() - ChronoDuration::minutes(1),
    )]);
    let notifier = Arc::new(RecordingNotifier::default());
    let pipeline = Arc::new(pipeline(
        Arc::new(store.clone()),
        Arc::new(CountingCompletion::new("Short summary.")),
        notifier.clone(),
    ));

    let (tx, rx) = watch::channel(false);
    let handle = spawn_scheduler(pipeline.clone(), rx);

    assert!(wait_for(|| notifier.messages().len() == 1).await);
    assert!(pipeline.last_report().is_some());

    tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("scheduler should stop")
        .unwrap();

    // hourly interval: no second run happened in the meantime
    assert_eq!(notifier.messages().len(), 1);
    assert_eq!(
        store.get("p1").unwrap().summary.as_deref(),
        Some("Short summary.")
    );
}

#[tokio::test]
async fn dropping_the_shutdown_sender_stops_the_loop() {
    let pipeline = Arc::new(pipeline(
        Arc::new(MemoryStore::new()),
        Arc::new(CountingCompletion::new("x")),
        Arc::new(RecordingNotifier::default()),
    ));
    let (tx, rx) = watch::channel(false);
    let handle = spawn_scheduler(pipeline.clone(), rx);

    assert!(wait_for(|| pipeline.last_report().is_some()).await);
    drop(tx);

    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("scheduler should stop")
        .unwrap();
}

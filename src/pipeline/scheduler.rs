// src/pipeline/scheduler.rs
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::Pipeline;
use crate::error::RunError;

enum Wake {
    Tick,
    Signal,
    Closed,
}

/// Spawn the recurring driver. Call once the gateway reported ready.
///
/// The first tick fires immediately. Runs never overlap: the loop awaits each
/// run, and ticks missed while a run was in flight are dropped. The task ends
/// when `shutdown` flips to `true` or its sender is dropped.
pub fn spawn_scheduler(pipeline: Arc<Pipeline>, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(pipeline.cfg().interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            let wake = tokio::select! {
                _ = ticker.tick() => Wake::Tick,
                changed = shutdown.changed() => match changed {
                    Ok(()) => Wake::Signal,
                    Err(_) => Wake::Closed,
                },
            };
            if matches!(wake, Wake::Closed) || *shutdown.borrow() {
                break;
            }
            if matches!(wake, Wake::Signal) {
                continue;
            }

            tracing::debug!(target: "scheduler", "pipeline tick");
            match pipeline.run_until(Utc::now(), &shutdown).await {
                Ok(_) => {}
                Err(RunError::Cancelled(state)) => {
                    tracing::info!(target: "scheduler", state, "run cancelled by shutdown");
                    break;
                }
                // already logged by the run; next tick retries
                Err(_) => {}
            }
        }
        tracing::info!(target: "scheduler", "scheduler stopped");
    })
}

// src/api.rs
//! Operational HTTP surface: liveness and the last run report.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::pipeline::{Pipeline, RunReport};

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
}

#[derive(Serialize)]
struct StatusResp {
    running: bool,
    last_run: Option<RunReport>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/status", get(status))
        .with_state(state)
}

async fn status(State(state): State<AppState>) -> Json<StatusResp> {
    Json(StatusResp {
        running: state.pipeline.is_running(),
        last_run: state.pipeline.last_report(),
    })
}

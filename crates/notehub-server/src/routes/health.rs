//! GET /health - liveness plus the size of the note store.
//!
//! Answers without the Bearer token so probes need no credentials.

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Notes currently held by the store.
    pub notes: usize,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        notes: state.store().len().await,
    })
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

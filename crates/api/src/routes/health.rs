//! Health check endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use projection_store::ProjectionStore;
use serde::Serialize;

use super::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub background_sync: &'static str,
    pub dead_letters: usize,
}

/// GET /health: returns service health and background worker status.
pub async fn check<S: ProjectionStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Json<HealthResponse> {
    let workers = state.orchestrator.workers();
    Json(HealthResponse {
        status: "ok",
        background_sync: if workers.is_accepting() {
            "running"
        } else {
            "stopped"
        },
        dead_letters: workers.dead_letters().len(),
    })
}

//! Post-commit callback endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use domain::ReservationLifecycleEvent;
use projection_store::ProjectionStore;
use sync_engine::SyncReport;

use super::AppState;
use crate::error::ApiError;

/// POST /events: synchronize the projections for a committed lifecycle change.
///
/// Responds `202 Accepted` once the event has been applied or queued; failed
/// projection writes are listed in the report, not turned into errors.
#[tracing::instrument(skip(state, payload))]
pub async fn publish<S: ProjectionStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<ReservationLifecycleEvent>, JsonRejection>,
) -> Result<(StatusCode, Json<SyncReport>), ApiError> {
    let Json(event) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let report = state.orchestrator.handle(event).await?;
    Ok((StatusCode::ACCEPTED, Json(report)))
}

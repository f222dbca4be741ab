//! Background job status endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use projection_store::ProjectionStore;
use serde::Serialize;
use sync_engine::{JobId, JobStatus};

use super::AppState;
use crate::error::ApiError;

#[derive(Serialize)]
pub struct JobStatusResponse {
    pub job_id: JobId,
    #[serde(flatten)]
    pub status: JobStatus,
}

/// GET /jobs/{job_id}: where a deferred sync job stands.
pub async fn status<S: ProjectionStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(job_id): Path<JobId>,
) -> Result<Json<JobStatusResponse>, ApiError> {
    let status = state
        .orchestrator
        .workers()
        .job_status(job_id)
        .ok_or_else(|| ApiError::NotFound(format!("Job {job_id} not found")))?;
    Ok(Json(JobStatusResponse { job_id, status }))
}

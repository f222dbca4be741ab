//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use projections::ProjectionError;
use sync_engine::SyncError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// The event was rejected by the orchestrator.
    Sync(SyncError),
    /// Reading a projection failed.
    Projection(ProjectionError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Sync(err) => sync_error_to_response(err),
            ApiError::Projection(err) => projection_error_to_response(err),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn sync_error_to_response(err: SyncError) -> (StatusCode, String) {
    match &err {
        SyncError::Validation(_) => (StatusCode::BAD_REQUEST, err.to_string()),
    }
}

fn projection_error_to_response(err: ProjectionError) -> (StatusCode, String) {
    if err.is_retryable() {
        tracing::warn!(error = %err, "projection store unavailable");
        (StatusCode::SERVICE_UNAVAILABLE, err.to_string())
    } else {
        tracing::error!(error = %err, "projection read failed");
        (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
    }
}

impl From<SyncError> for ApiError {
    fn from(err: SyncError) -> Self {
        ApiError::Sync(err)
    }
}

impl From<ProjectionError> for ApiError {
    fn from(err: ProjectionError) -> Self {
        ApiError::Projection(err)
    }
}

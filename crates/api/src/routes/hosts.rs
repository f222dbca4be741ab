//! Host reservation index read endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use chrono::NaiveDate;
use common::HostId;
use projection_store::{HostReservationEntry, ProjectionStore};
use serde::Serialize;

use super::AppState;
use super::availability::LimitQuery;
use crate::error::ApiError;

#[derive(Serialize)]
pub struct HostReservationsResponse {
    pub host_id: HostId,
    pub date: NaiveDate,
    pub reservations: Vec<HostReservationEntry>,
}

/// GET /hosts/{host_id}/reservations/{date}?limit=..: reservations checking in on a date.
pub async fn reservations<S: ProjectionStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path((host_id, date)): Path<(i64, NaiveDate)>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<HostReservationsResponse>, ApiError> {
    let host_id = HostId::new(host_id);
    let reservations = state
        .host_index
        .reservations_on(host_id, date, query.effective())
        .await?;
    Ok(Json(HostReservationsResponse {
        host_id,
        date,
        reservations,
    }))
}

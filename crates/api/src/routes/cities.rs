//! City reservation index read endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use chrono::NaiveDate;
use common::CityId;
use projection_store::{CityReservationEntry, ProjectionStore};
use serde::Serialize;

use super::AppState;
use super::availability::LimitQuery;
use crate::error::ApiError;

#[derive(Serialize)]
pub struct CityReservationsResponse {
    pub city_id: CityId,
    pub date: NaiveDate,
    pub reservations: Vec<CityReservationEntry>,
}

/// GET /cities/{city_id}/reservations/{date}?limit=..: reservations checking in on a date.
pub async fn reservations<S: ProjectionStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path((city_id, date)): Path<(i64, NaiveDate)>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<CityReservationsResponse>, ApiError> {
    let city_id = CityId::new(city_id);
    let reservations = state
        .city_index
        .reservations_on(city_id, date, query.effective())
        .await?;
    Ok(Json(CityReservationsResponse {
        city_id,
        date,
        reservations,
    }))
}

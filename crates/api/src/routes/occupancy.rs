//! Occupancy ledger read endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use chrono::NaiveDate;
use common::CityId;
use projection_store::{OccupancyCounter, ProjectionStore};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::error::ApiError;

/// Longest range a single report may cover.
const MAX_REPORT_DAYS: i64 = 366;

#[derive(Deserialize)]
pub struct RangeQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

#[derive(Serialize)]
pub struct OccupancyReportResponse {
    pub city_id: CityId,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub days_with_data: usize,
    pub nights_occupied: i64,
    pub nights_available: i64,
    pub occupancy_rate: f64,
}

/// GET /occupancy/{city_id}/{date}: the counter for one city and date.
pub async fn get<S: ProjectionStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path((city_id, date)): Path<(i64, NaiveDate)>,
) -> Result<Json<OccupancyCounter>, ApiError> {
    let city_id = CityId::new(city_id);
    let counter = state
        .ledger
        .counter(city_id, date)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No occupancy for city {city_id} on {date}")))?;
    Ok(Json(counter))
}

/// GET /occupancy/{city_id}?from=..&to=..: aggregated occupancy over `from..=to`.
pub async fn report<S: ProjectionStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(city_id): Path<i64>,
    Query(range): Query<RangeQuery>,
) -> Result<Json<OccupancyReportResponse>, ApiError> {
    if range.to < range.from {
        return Err(ApiError::BadRequest(format!(
            "Invalid range: {} is before {}",
            range.to, range.from
        )));
    }
    if (range.to - range.from).num_days() >= MAX_REPORT_DAYS {
        return Err(ApiError::BadRequest(format!(
            "Range too long: at most {MAX_REPORT_DAYS} days"
        )));
    }

    let report = state
        .ledger
        .report(CityId::new(city_id), range.from, range.to)
        .await?;
    Ok(Json(OccupancyReportResponse {
        occupancy_rate: report.occupancy_rate(),
        city_id: report.city_id,
        from: report.from,
        to: report.to,
        days_with_data: report.days_with_data,
        nights_occupied: report.nights_occupied,
        nights_available: report.nights_available,
    }))
}

//! Availability flag read endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use chrono::NaiveDate;
use common::{CityId, PropertyId};
use projection_store::ProjectionStore;
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::error::ApiError;

const DEFAULT_LIMIT: usize = 100;
const MAX_LIMIT: usize = 1000;

#[derive(Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

impl LimitQuery {
    /// The requested limit, defaulted and capped.
    pub fn effective(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }
}

#[derive(Deserialize)]
pub struct AvailabilityQuery {
    pub city_id: Option<i64>,
    pub limit: Option<usize>,
}

#[derive(Serialize)]
pub struct AvailablePropertiesResponse {
    pub date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city_id: Option<CityId>,
    pub property_ids: Vec<PropertyId>,
}

/// GET /availability/{date}?city_id=..&limit=..: properties bookable on a date.
pub async fn list<S: ProjectionStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(date): Path<NaiveDate>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailablePropertiesResponse>, ApiError> {
    let city_id = query.city_id.map(CityId::new);
    let limit = LimitQuery { limit: query.limit }.effective();
    let property_ids = state
        .flags
        .available_properties(date, city_id, limit)
        .await?;
    Ok(Json(AvailablePropertiesResponse {
        date,
        city_id,
        property_ids,
    }))
}

//! Projection error types.

use chrono::NaiveDate;
use common::CityId;
use thiserror::Error;

/// Errors that can occur while updating or reading a projection.
#[derive(Debug, Error)]
pub enum ProjectionError {
    /// An error occurred in the secondary store.
    #[error("Store error: {0}")]
    Store(#[from] projection_store::StoreError),

    /// The counter row vanished between its conditional insert and the increment.
    #[error("Occupancy counter missing for city {city_id} on {date}")]
    MissingCounter { city_id: CityId, date: NaiveDate },
}

impl ProjectionError {
    /// Returns true if the underlying failure is transient.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProjectionError::Store(err) => err.is_retryable(),
            ProjectionError::MissingCounter { .. } => false,
        }
    }
}

/// Result type for projection operations.
pub type Result<T> = std::result::Result<T, ProjectionError>;

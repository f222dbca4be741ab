//! Secondary store client for the reservation projections.
//!
//! - [`ProjectionStore`]: the client contract used by the projections
//! - [`InMemoryProjectionStore`] and [`PostgresProjectionStore`] implementations
//! - [`RetryingStore`]: bounded exponential backoff around any store

pub mod error;
pub mod memory;
pub mod model;
pub mod postgres;
pub mod retry;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryProjectionStore;
pub use model::{AvailabilityFlag, CityReservationEntry, HostReservationEntry, OccupancyCounter};
pub use postgres::PostgresProjectionStore;
pub use retry::{RetryPolicy, RetryingStore};
pub use store::ProjectionStore;

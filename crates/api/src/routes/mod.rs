//! HTTP route handlers.

pub mod availability;
pub mod cities;
pub mod events;
pub mod health;
pub mod hosts;
pub mod jobs;
pub mod metrics;
pub mod occupancy;

use projections::{
    AvailabilityFlags, CityReservationIndex, HostReservationIndex, OccupancyLedger,
};
use sync_engine::SyncOrchestrator;

/// Shared application state accessible from all handlers.
pub struct AppState<S> {
    pub orchestrator: SyncOrchestrator<S>,
    pub ledger: OccupancyLedger<S>,
    pub flags: AvailabilityFlags<S>,
    pub host_index: HostReservationIndex<S>,
    pub city_index: CityReservationIndex<S>,
}

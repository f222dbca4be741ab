//! The derived projections kept in the secondary store.

pub mod availability;
pub mod city_reservations;
pub mod host_reservations;
pub mod occupancy;

pub use availability::AvailabilityFlags;
pub use city_reservations::{CityReservation, CityReservationIndex};
pub use host_reservations::{HostReservation, HostReservationIndex};
pub use occupancy::{OccupancyDelta, OccupancyLedger, OccupancyReport};

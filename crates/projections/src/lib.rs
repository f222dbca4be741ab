//! Derived, read-optimized projections of the reservation lifecycle.
//!
//! This crate provides the views kept in the secondary store:
//! - [`OccupancyLedger`]: per (city, date) occupied/available night counters
//! - [`AvailabilityFlags`]: per (property, date) bookable flag, last write wins
//! - [`HostReservationIndex`]: reservations by (host, check-in date)
//! - [`CityReservationIndex`]: reservations by (city, check-in date)

pub mod error;
pub mod projection;
pub mod views;

pub use error::{ProjectionError, Result};
pub use projection::Projection;
pub use views::{
    AvailabilityFlags, CityReservation, CityReservationIndex, HostReservation,
    HostReservationIndex, OccupancyDelta, OccupancyLedger, OccupancyReport,
};

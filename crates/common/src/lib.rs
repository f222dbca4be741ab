//! Shared identifiers and value types for the projection sync workspace.

pub mod money;
pub mod types;

pub use money::Money;
pub use types::{CityId, EventId, GuestId, HostId, PropertyId, ReservationId};

//! Rows persisted in the projection collections.

use chrono::{DateTime, NaiveDate, Utc};
use common::{CityId, GuestId, HostId, Money, PropertyId, ReservationId};
use domain::ReservationStatus;
use serde::{Deserialize, Serialize};

/// Occupied and available nights for one city on one date.
///
/// Both counters are clamped at zero by every store implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccupancyCounter {
    pub city_id: CityId,
    pub date: NaiveDate,
    pub nights_occupied: i64,
    pub nights_available: i64,
}

impl OccupancyCounter {
    /// The base row written by a conditional insert.
    pub fn initial(city_id: CityId, date: NaiveDate) -> Self {
        Self {
            city_id,
            date,
            nights_occupied: 0,
            nights_available: 1,
        }
    }

    /// Returns the counter with signed deltas applied, clamped at zero.
    pub fn with_delta(&self, occupied_delta: i64, available_delta: i64) -> Self {
        Self {
            nights_occupied: (self.nights_occupied + occupied_delta).max(0),
            nights_available: (self.nights_available + available_delta).max(0),
            ..*self
        }
    }
}

/// Whether a property can be booked on a date. Last write wins.
///
/// The property's city is stored alongside so listings can be narrowed to one city.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityFlag {
    pub property_id: PropertyId,
    pub city_id: CityId,
    pub date: NaiveDate,
    pub available: bool,
    pub updated_at: DateTime<Utc>,
}

impl AvailabilityFlag {
    pub fn now(
        property_id: PropertyId,
        city_id: CityId,
        date: NaiveDate,
        available: bool,
    ) -> Self {
        Self {
            property_id,
            city_id,
            date,
            available,
            updated_at: Utc::now(),
        }
    }
}

/// A reservation listed under its host and check-in date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostReservationEntry {
    pub host_id: HostId,
    pub date: NaiveDate,
    pub reservation_id: ReservationId,
    pub property_id: PropertyId,
    pub guest_id: GuestId,
    pub amount: Money,
    pub status: ReservationStatus,
    pub created_at: DateTime<Utc>,
}

/// A reservation listed under its city and check-in date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityReservationEntry {
    pub city_id: CityId,
    pub date: NaiveDate,
    pub reservation_id: ReservationId,
    pub property_id: PropertyId,
    pub host_id: HostId,
    pub guest_id: GuestId,
    pub amount: Money,
    pub status: ReservationStatus,
    pub created_at: DateTime<Utc>,
}

use async_trait::async_trait;
use chrono::NaiveDate;
use common::{CityId, HostId, PropertyId, ReservationId};

use crate::{
    AvailabilityFlag, CityReservationEntry, HostReservationEntry, OccupancyCounter, Result,
};

/// Client contract of the secondary store holding the derived projections.
///
/// Implementations are cheap to clone handles over a shared connection pool
/// and must be thread-safe (Send + Sync). No method reads before it writes
/// unless its documentation says so.
#[async_trait]
pub trait ProjectionStore: Send + Sync {
    /// Inserts the base counter `(0, 1)` for `(city, date)` if no row exists.
    ///
    /// Returns true if the row was created by this call.
    async fn init_occupancy(&self, city_id: CityId, date: NaiveDate) -> Result<bool>;

    /// Atomically adds signed deltas to an existing counter.
    ///
    /// Each field is clamped at zero. Returns the updated counter, or `None`
    /// if no row exists for `(city, date)`.
    async fn increment_occupancy(
        &self,
        city_id: CityId,
        date: NaiveDate,
        occupied_delta: i64,
        available_delta: i64,
    ) -> Result<Option<OccupancyCounter>>;

    /// Retrieves the counter for `(city, date)`.
    async fn get_occupancy(
        &self,
        city_id: CityId,
        date: NaiveDate,
    ) -> Result<Option<OccupancyCounter>>;

    /// Retrieves every counter of a city with `from <= date <= to`, ascending by date.
    async fn occupancy_range(
        &self,
        city_id: CityId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<OccupancyCounter>>;

    /// Writes a flag unconditionally, replacing any previous value.
    async fn upsert_availability(&self, flag: AvailabilityFlag) -> Result<()>;

    /// Retrieves the flag for `(property, date)`.
    async fn get_availability(
        &self,
        property_id: PropertyId,
        date: NaiveDate,
    ) -> Result<Option<AvailabilityFlag>>;

    /// Retrieves flags marked available on `date`, ascending by property id.
    ///
    /// With `city_id` set, only properties of that city are listed.
    async fn available_properties(
        &self,
        date: NaiveDate,
        city_id: Option<CityId>,
        limit: usize,
    ) -> Result<Vec<AvailabilityFlag>>;

    /// Inserts a host-index row, replacing a row with the same key.
    async fn insert_host_reservation(&self, entry: HostReservationEntry) -> Result<()>;

    /// Deletes a host-index row. Returns true if a row was removed.
    async fn delete_host_reservation(
        &self,
        host_id: HostId,
        date: NaiveDate,
        reservation_id: ReservationId,
    ) -> Result<bool>;

    /// Retrieves the rows of a host for one check-in date, ascending by reservation id.
    async fn host_reservations(
        &self,
        host_id: HostId,
        date: NaiveDate,
        limit: usize,
    ) -> Result<Vec<HostReservationEntry>>;

    /// Inserts a city-index row, replacing a row with the same key.
    async fn insert_city_reservation(&self, entry: CityReservationEntry) -> Result<()>;

    /// Deletes a city-index row. Returns true if a row was removed.
    async fn delete_city_reservation(
        &self,
        city_id: CityId,
        date: NaiveDate,
        reservation_id: ReservationId,
    ) -> Result<bool>;

    /// Retrieves the rows of a city for one check-in date, ascending by reservation id.
    async fn city_reservations(
        &self,
        city_id: CityId,
        date: NaiveDate,
        limit: usize,
    ) -> Result<Vec<CityReservationEntry>>;
}

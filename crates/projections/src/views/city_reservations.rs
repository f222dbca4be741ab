//! City reservation index: reservations listed by city and check-in date.

use chrono::{NaiveDate, Utc};
use common::{CityId, GuestId, HostId, Money, PropertyId, ReservationId};
use domain::ReservationStatus;
use projection_store::{CityReservationEntry, ProjectionStore};
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::projection::{Projection, record_write};

const COLLECTION: &str = "reservations_by_city_date";

/// Reservation details stored under a city key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityReservation {
    pub reservation_id: ReservationId,
    pub property_id: PropertyId,
    pub host_id: HostId,
    pub guest_id: GuestId,
    pub amount: Money,
}

/// Secondary lookup of reservations by (city, check-in date).
///
/// Maintained on the same create and cancel path as the host index.
#[derive(Clone)]
pub struct CityReservationIndex<S> {
    store: S,
}

impl<S: ProjectionStore> CityReservationIndex<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self, reservation), fields(collection = COLLECTION, reservation_id = %reservation.reservation_id))]
    pub async fn insert(
        &self,
        city_id: CityId,
        check_in: NaiveDate,
        reservation: CityReservation,
    ) -> Result<()> {
        let entry = CityReservationEntry {
            city_id,
            date: check_in,
            reservation_id: reservation.reservation_id,
            property_id: reservation.property_id,
            host_id: reservation.host_id,
            guest_id: reservation.guest_id,
            amount: reservation.amount,
            status: ReservationStatus::Confirmed,
            created_at: Utc::now(),
        };
        let result = self.store.insert_city_reservation(entry).await;
        record_write(COLLECTION, result.is_ok());
        Ok(result?)
    }

    /// Removes a reservation from the index. Returns true if it was listed.
    #[tracing::instrument(skip(self), fields(collection = COLLECTION))]
    pub async fn remove(
        &self,
        city_id: CityId,
        check_in: NaiveDate,
        reservation_id: ReservationId,
    ) -> Result<bool> {
        let result = self
            .store
            .delete_city_reservation(city_id, check_in, reservation_id)
            .await;
        record_write(COLLECTION, result.is_ok());
        Ok(result?)
    }

    /// Reservations in a city starting on `date`, ascending by id.
    pub async fn reservations_on(
        &self,
        city_id: CityId,
        date: NaiveDate,
        limit: usize,
    ) -> Result<Vec<CityReservationEntry>> {
        Ok(self.store.city_reservations(city_id, date, limit).await?)
    }
}

impl<S: ProjectionStore> Projection for CityReservationIndex<S> {
    fn name(&self) -> &'static str {
        "CityReservationIndex"
    }

    fn collection(&self) -> &'static str {
        COLLECTION
    }
}

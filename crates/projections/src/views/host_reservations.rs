//! Host reservation index: reservations listed by host and check-in date.

use chrono::{NaiveDate, Utc};
use common::{GuestId, HostId, Money, PropertyId, ReservationId};
use domain::ReservationStatus;
use projection_store::{HostReservationEntry, ProjectionStore};
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::projection::{Projection, record_write};

const COLLECTION: &str = "reservations_by_host_date";

/// The reservation details stored alongside the index key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostReservation {
    pub reservation_id: ReservationId,
    pub property_id: PropertyId,
    pub guest_id: GuestId,
    pub amount: Money,
}

/// Secondary lookup of reservations by (host, check-in date).
///
/// Only the check-in date is indexed, not every night of the stay. The ledger
/// never reads this index.
#[derive(Clone)]
pub struct HostReservationIndex<S> {
    store: S,
}

impl<S: ProjectionStore> HostReservationIndex<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Lists a reservation under its host and check-in date.
    #[tracing::instrument(skip(self, reservation), fields(collection = COLLECTION, reservation_id = %reservation.reservation_id))]
    pub async fn insert(
        &self,
        host_id: HostId,
        check_in: NaiveDate,
        reservation: HostReservation,
    ) -> Result<()> {
        let entry = HostReservationEntry {
            host_id,
            date: check_in,
            reservation_id: reservation.reservation_id,
            property_id: reservation.property_id,
            guest_id: reservation.guest_id,
            amount: reservation.amount,
            status: ReservationStatus::Confirmed,
            created_at: Utc::now(),
        };
        let result = self.store.insert_host_reservation(entry).await;
        record_write(COLLECTION, result.is_ok());
        Ok(result?)
    }

    /// Removes a reservation from the index. Returns true if it was listed.
    #[tracing::instrument(skip(self), fields(collection = COLLECTION))]
    pub async fn remove(
        &self,
        host_id: HostId,
        check_in: NaiveDate,
        reservation_id: ReservationId,
    ) -> Result<bool> {
        let result = self
            .store
            .delete_host_reservation(host_id, check_in, reservation_id)
            .await;
        record_write(COLLECTION, result.is_ok());
        let removed = result?;
        if !removed {
            tracing::debug!("reservation was not indexed");
        }
        Ok(removed)
    }

    /// Reservations of a host starting on `date`.
    pub async fn reservations_on(
        &self,
        host_id: HostId,
        date: NaiveDate,
        limit: usize,
    ) -> Result<Vec<HostReservationEntry>> {
        Ok(self.store.host_reservations(host_id, date, limit).await?)
    }
}

impl<S: ProjectionStore> Projection for HostReservationIndex<S> {
    fn name(&self) -> &'static str {
        "HostReservationIndex"
    }

    fn collection(&self) -> &'static str {
        COLLECTION
    }
}

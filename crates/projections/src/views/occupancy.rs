//! Occupancy ledger: occupied vs. available nights per city and date.

use chrono::NaiveDate;
use common::CityId;
use projection_store::{OccupancyCounter, ProjectionStore};
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::error::ProjectionError;
use crate::projection::{Projection, record_write};

const COLLECTION: &str = "occupancy_by_city";

/// A signed change to an occupancy counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OccupancyDelta {
    pub occupied: i64,
    pub available: i64,
}

impl OccupancyDelta {
    /// One night taken by a new reservation.
    pub const RESERVE: Self = Self::new(1, -1);
    /// One night freed by a cancellation.
    pub const RELEASE: Self = Self::new(-1, 1);
    /// One night added to the calendar by a newly listed property.
    pub const ONBOARD: Self = Self::new(0, 1);

    pub const fn new(occupied: i64, available: i64) -> Self {
        Self {
            occupied,
            available,
        }
    }

    /// The delta that undoes this one.
    pub const fn inverse(&self) -> Self {
        Self::new(-self.occupied, -self.available)
    }
}

impl std::fmt::Display for OccupancyDelta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:+}, {:+})", self.occupied, self.available)
    }
}

/// Occupancy of a city aggregated over a date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccupancyReport {
    pub city_id: CityId,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub days_with_data: usize,
    pub nights_occupied: i64,
    pub nights_available: i64,
}

impl OccupancyReport {
    /// Sums counters into a report.
    pub fn from_counters(
        city_id: CityId,
        from: NaiveDate,
        to: NaiveDate,
        counters: &[OccupancyCounter],
    ) -> Self {
        Self {
            city_id,
            from,
            to,
            days_with_data: counters.len(),
            nights_occupied: counters.iter().map(|c| c.nights_occupied).sum(),
            nights_available: counters.iter().map(|c| c.nights_available).sum(),
        }
    }

    pub fn total_nights(&self) -> i64 {
        self.nights_occupied + self.nights_available
    }

    /// Occupied share of all nights, in percent. Zero when there are no nights.
    pub fn occupancy_rate(&self) -> f64 {
        let total = self.total_nights();
        if total == 0 {
            return 0.0;
        }
        self.nights_occupied as f64 / total as f64 * 100.0
    }
}

/// Per (city, date) signed counters of occupied and available nights.
///
/// Counters are created by a conditional insert and only ever mutated by
/// atomic signed deltas; they are never deleted.
#[derive(Clone)]
pub struct OccupancyLedger<S> {
    store: S,
}

impl<S: ProjectionStore> OccupancyLedger<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Inserts the base counter `(0, 1)` if the row is absent.
    ///
    /// Returns true if this call created the row.
    #[tracing::instrument(skip(self), fields(collection = COLLECTION))]
    pub async fn init_counter(&self, city_id: CityId, date: NaiveDate) -> Result<bool> {
        let result = self.store.init_occupancy(city_id, date).await;
        record_write(COLLECTION, result.is_ok());
        Ok(result?)
    }

    /// Applies a signed delta to the counter, creating its base row first.
    ///
    /// The increment itself is a single atomic store operation, so concurrent
    /// events touching the same (city, date) converge regardless of order.
    #[tracing::instrument(skip(self, delta), fields(collection = COLLECTION, %delta))]
    pub async fn apply_delta(
        &self,
        city_id: CityId,
        date: NaiveDate,
        delta: OccupancyDelta,
    ) -> Result<OccupancyCounter> {
        self.init_counter(city_id, date).await?;

        let result = self
            .store
            .increment_occupancy(city_id, date, delta.occupied, delta.available)
            .await;
        record_write(COLLECTION, result.is_ok());

        let counter = result?.ok_or(ProjectionError::MissingCounter { city_id, date })?;
        tracing::debug!(
            nights_occupied = counter.nights_occupied,
            nights_available = counter.nights_available,
            "occupancy updated"
        );
        Ok(counter)
    }

    /// Gets the counter for a city on a date.
    pub async fn counter(
        &self,
        city_id: CityId,
        date: NaiveDate,
    ) -> Result<Option<OccupancyCounter>> {
        Ok(self.store.get_occupancy(city_id, date).await?)
    }

    /// Gets the counters of a city for `from..=to`, ascending by date.
    pub async fn counters(
        &self,
        city_id: CityId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<OccupancyCounter>> {
        Ok(self.store.occupancy_range(city_id, from, to).await?)
    }

    /// Aggregates the counters of a city for `from..=to`.
    pub async fn report(
        &self,
        city_id: CityId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<OccupancyReport> {
        let counters = self.counters(city_id, from, to).await?;
        Ok(OccupancyReport::from_counters(city_id, from, to, &counters))
    }
}

impl<S: ProjectionStore> Projection for OccupancyLedger<S> {
    fn name(&self) -> &'static str {
        "OccupancyLedger"
    }

    fn collection(&self) -> &'static str {
        COLLECTION
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use projection_store::InMemoryProjectionStore;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    fn ledger() -> (OccupancyLedger<InMemoryProjectionStore>, InMemoryProjectionStore) {
        let store = InMemoryProjectionStore::new();
        (OccupancyLedger::new(store.clone()), store)
    }

    #[tokio::test]
    async fn init_counter_is_idempotent() {
        let (ledger, _) = ledger();
        let city = CityId::new(1);

        assert!(ledger.init_counter(city, date(1)).await.unwrap());
        let first = ledger.counter(city, date(1)).await.unwrap().unwrap();
        assert!(!ledger.init_counter(city, date(1)).await.unwrap());
        let second = ledger.counter(city, date(1)).await.unwrap().unwrap();

        assert_eq!(first, second);
        assert_eq!(second.nights_occupied, 0);
        assert_eq!(second.nights_available, 1);
    }

    #[tokio::test]
    async fn init_counter_never_resets_an_existing_row() {
        let (ledger, _) = ledger();
        let city = CityId::new(1);

        ledger
            .apply_delta(city, date(1), OccupancyDelta::RESERVE)
            .await
            .unwrap();
        ledger.init_counter(city, date(1)).await.unwrap();

        let counter = ledger.counter(city, date(1)).await.unwrap().unwrap();
        assert_eq!(counter.nights_occupied, 1);
    }

    #[tokio::test]
    async fn apply_delta_creates_base_row_first() {
        let (ledger, _) = ledger();
        let counter = ledger
            .apply_delta(CityId::new(1), date(1), OccupancyDelta::RESERVE)
            .await
            .unwrap();
        assert_eq!(counter.nights_occupied, 1);
        assert_eq!(counter.nights_available, 0);
    }

    #[tokio::test]
    async fn delta_and_inverse_cancel_out() {
        let (ledger, _) = ledger();
        let city = CityId::new(1);
        ledger
            .apply_delta(city, date(1), OccupancyDelta::ONBOARD)
            .await
            .unwrap();
        let before = ledger.counter(city, date(1)).await.unwrap().unwrap();

        ledger
            .apply_delta(city, date(1), OccupancyDelta::RESERVE)
            .await
            .unwrap();
        let after = ledger
            .apply_delta(city, date(1), OccupancyDelta::RESERVE.inverse())
            .await
            .unwrap();

        assert_eq!(OccupancyDelta::RESERVE.inverse(), OccupancyDelta::RELEASE);
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn counters_never_go_negative() {
        let (ledger, _) = ledger();
        let counter = ledger
            .apply_delta(CityId::new(1), date(1), OccupancyDelta::RELEASE)
            .await
            .unwrap();
        assert_eq!(counter.nights_occupied, 0);
        assert_eq!(counter.nights_available, 2);
    }

    #[tokio::test]
    async fn store_failure_surfaces_as_error() {
        let (ledger, store) = ledger();
        store.fail_next_writes(1).await;

        let result = ledger
            .apply_delta(CityId::new(1), date(1), OccupancyDelta::RESERVE)
            .await;
        let err = result.unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn report_sums_range_and_computes_rate() {
        let (ledger, _) = ledger();
        let city = CityId::new(1);
        for day in 1..=4 {
            ledger
                .apply_delta(city, date(day), OccupancyDelta::ONBOARD)
                .await
                .unwrap();
        }
        ledger
            .apply_delta(city, date(2), OccupancyDelta::RESERVE)
            .await
            .unwrap();

        let report = ledger.report(city, date(1), date(3)).await.unwrap();
        assert_eq!(report.days_with_data, 3);
        assert_eq!(report.nights_occupied, 1);
        assert_eq!(report.nights_available, 5);
        assert!((report.occupancy_rate() - 100.0 / 6.0).abs() < 1e-9);
    }

    #[test]
    fn empty_report_has_zero_rate() {
        let report = OccupancyReport::from_counters(CityId::new(1), date(1), date(2), &[]);
        assert_eq!(report.total_nights(), 0);
        assert_eq!(report.occupancy_rate(), 0.0);
    }

    #[test]
    fn delta_display_is_signed() {
        assert_eq!(OccupancyDelta::RESERVE.to_string(), "(+1, -1)");
        assert_eq!(OccupancyDelta::ONBOARD.to_string(), "(+0, +1)");
    }
}

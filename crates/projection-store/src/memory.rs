use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use common::{CityId, HostId, PropertyId, ReservationId};
use tokio::sync::{OwnedRwLockWriteGuard, RwLock, RwLockWriteGuard};

use crate::{
    AvailabilityFlag, CityReservationEntry, HostReservationEntry, OccupancyCounter,
    ProjectionStore, Result, StoreError,
};

#[derive(Debug, Default)]
struct Faults {
    /// Number of upcoming writes that fail regardless of key.
    fail_next: usize,
    /// Dates on which every write fails.
    failing_dates: HashSet<NaiveDate>,
}

#[derive(Debug, Default)]
struct MemoryState {
    occupancy: BTreeMap<(CityId, NaiveDate), OccupancyCounter>,
    availability: BTreeMap<(PropertyId, NaiveDate), AvailabilityFlag>,
    host_reservations: BTreeMap<(HostId, NaiveDate, ReservationId), HostReservationEntry>,
    city_reservations: BTreeMap<(CityId, NaiveDate, ReservationId), CityReservationEntry>,
    faults: Faults,
    write_attempts: u64,
}

impl MemoryState {
    /// Counts a write attempt and raises an injected fault if one applies.
    fn begin_write(&mut self, date: NaiveDate) -> Result<()> {
        self.write_attempts += 1;
        if self.faults.fail_next > 0 {
            self.faults.fail_next -= 1;
            return Err(StoreError::Connection(
                "injected fault: store unreachable".to_string(),
            ));
        }
        if self.faults.failing_dates.contains(&date) {
            return Err(StoreError::Connection(format!(
                "injected fault: store unreachable for {date}"
            )));
        }
        Ok(())
    }
}

/// In-memory projection store for tests and local runs.
///
/// Provides the same contract as the PostgreSQL implementation. Writes can be
/// made to fail with [`StoreError::Connection`] to exercise failure isolation.
#[derive(Clone, Default)]
pub struct InMemoryProjectionStore {
    state: Arc<RwLock<MemoryState>>,
    write_gate: Arc<RwLock<()>>,
}

impl InMemoryProjectionStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` writes fail.
    pub async fn fail_next_writes(&self, count: usize) {
        self.state.write().await.faults.fail_next = count;
    }

    /// Makes every write keyed on `date` fail until cleared.
    pub async fn fail_writes_on(&self, date: NaiveDate) {
        self.state.write().await.faults.failing_dates.insert(date);
    }

    /// Removes all injected faults.
    pub async fn clear_faults(&self) {
        self.state.write().await.faults = Faults::default();
    }

    /// Returns the number of write calls received, including failed ones.
    pub async fn write_attempts(&self) -> u64 {
        self.state.read().await.write_attempts
    }

    /// Returns every occupancy counter, ordered by city then date.
    pub async fn all_occupancy(&self) -> Vec<OccupancyCounter> {
        self.state.read().await.occupancy.values().copied().collect()
    }

    /// Returns the number of availability flags stored.
    pub async fn availability_count(&self) -> usize {
        self.state.read().await.availability.len()
    }

    /// Returns the number of host-index rows stored.
    pub async fn host_reservation_count(&self) -> usize {
        self.state.read().await.host_reservations.len()
    }

    /// Returns the number of city-index rows stored.
    pub async fn city_reservation_count(&self) -> usize {
        self.state.read().await.city_reservations.len()
    }

    /// Holds every write until the returned guard is dropped. Reads continue.
    pub async fn pause_writes(&self) -> OwnedRwLockWriteGuard<()> {
        self.write_gate.clone().write_owned().await
    }

    async fn lock_for_write(&self) -> RwLockWriteGuard<'_, MemoryState> {
        drop(self.write_gate.read().await);
        self.state.write().await
    }
}

#[async_trait]
impl ProjectionStore for InMemoryProjectionStore {
    async fn init_occupancy(&self, city_id: CityId, date: NaiveDate) -> Result<bool> {
        let mut state = self.lock_for_write().await;
        state.begin_write(date)?;

        if state.occupancy.contains_key(&(city_id, date)) {
            return Ok(false);
        }
        state
            .occupancy
            .insert((city_id, date), OccupancyCounter::initial(city_id, date));
        Ok(true)
    }

    async fn increment_occupancy(
        &self,
        city_id: CityId,
        date: NaiveDate,
        occupied_delta: i64,
        available_delta: i64,
    ) -> Result<Option<OccupancyCounter>> {
        let mut state = self.lock_for_write().await;
        state.begin_write(date)?;

        Ok(state.occupancy.get_mut(&(city_id, date)).map(|counter| {
            *counter = counter.with_delta(occupied_delta, available_delta);
            *counter
        }))
    }

    async fn get_occupancy(
        &self,
        city_id: CityId,
        date: NaiveDate,
    ) -> Result<Option<OccupancyCounter>> {
        Ok(self.state.read().await.occupancy.get(&(city_id, date)).copied())
    }

    async fn occupancy_range(
        &self,
        city_id: CityId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<OccupancyCounter>> {
        if to < from {
            return Ok(Vec::new());
        }
        let state = self.state.read().await;
        Ok(state
            .occupancy
            .range((city_id, from)..=(city_id, to))
            .map(|(_, counter)| *counter)
            .collect())
    }

    async fn upsert_availability(&self, flag: AvailabilityFlag) -> Result<()> {
        let mut state = self.lock_for_write().await;
        state.begin_write(flag.date)?;
        state
            .availability
            .insert((flag.property_id, flag.date), flag);
        Ok(())
    }

    async fn get_availability(
        &self,
        property_id: PropertyId,
        date: NaiveDate,
    ) -> Result<Option<AvailabilityFlag>> {
        Ok(self
            .state
            .read()
            .await
            .availability
            .get(&(property_id, date))
            .copied())
    }

    async fn available_properties(
        &self,
        date: NaiveDate,
        city_id: Option<CityId>,
        limit: usize,
    ) -> Result<Vec<AvailabilityFlag>> {
        let state = self.state.read().await;
        Ok(state
            .availability
            .values()
            .filter(|flag| flag.date == date && flag.available)
            .filter(|flag| city_id.is_none_or(|city| flag.city_id == city))
            .take(limit)
            .copied()
            .collect())
    }

    async fn insert_host_reservation(&self, entry: HostReservationEntry) -> Result<()> {
        let mut state = self.lock_for_write().await;
        state.begin_write(entry.date)?;
        state
            .host_reservations
            .insert((entry.host_id, entry.date, entry.reservation_id), entry);
        Ok(())
    }

    async fn delete_host_reservation(
        &self,
        host_id: HostId,
        date: NaiveDate,
        reservation_id: ReservationId,
    ) -> Result<bool> {
        let mut state = self.lock_for_write().await;
        state.begin_write(date)?;
        Ok(state
            .host_reservations
            .remove(&(host_id, date, reservation_id))
            .is_some())
    }

    async fn host_reservations(
        &self,
        host_id: HostId,
        date: NaiveDate,
        limit: usize,
    ) -> Result<Vec<HostReservationEntry>> {
        let state = self.state.read().await;
        Ok(state
            .host_reservations
            .range(
                (host_id, date, ReservationId::new(i64::MIN))
                    ..=(host_id, date, ReservationId::new(i64::MAX)),
            )
            .take(limit)
            .map(|(_, entry)| entry.clone())
            .collect())
    }

    async fn insert_city_reservation(&self, entry: CityReservationEntry) -> Result<()> {
        let mut state = self.lock_for_write().await;
        state.begin_write(entry.date)?;
        state
            .city_reservations
            .insert((entry.city_id, entry.date, entry.reservation_id), entry);
        Ok(())
    }

    async fn delete_city_reservation(
        &self,
        city_id: CityId,
        date: NaiveDate,
        reservation_id: ReservationId,
    ) -> Result<bool> {
        let mut state = self.lock_for_write().await;
        state.begin_write(date)?;
        Ok(state
            .city_reservations
            .remove(&(city_id, date, reservation_id))
            .is_some())
    }

    async fn city_reservations(
        &self,
        city_id: CityId,
        date: NaiveDate,
        limit: usize,
    ) -> Result<Vec<CityReservationEntry>> {
        let state = self.state.read().await;
        Ok(state
            .city_reservations
            .range(
                (city_id, date, ReservationId::new(i64::MIN))
                    ..=(city_id, date, ReservationId::new(i64::MAX)),
            )
            .take(limit)
            .map(|(_, entry)| entry.clone())
            .collect())
    }
}

//! Bounded exponential backoff for transient store failures.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use common::{CityId, HostId, PropertyId, ReservationId};

use crate::{
    AvailabilityFlag, CityReservationEntry, HostReservationEntry, OccupancyCounter,
    ProjectionStore, Result,
};

/// How many times, and how patiently, a store call is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one. Zero is treated as one.
    pub max_attempts: u32,
    /// Delay before the first retry; doubled for every following retry.
    pub base_delay: Duration,
    /// Upper bound for a single delay.
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            max_delay,
        }
    }

    /// A policy that retries without sleeping.
    pub fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, Duration::ZERO, Duration::ZERO)
    }

    /// A policy that never retries.
    pub fn none() -> Self {
        Self::immediate(1)
    }

    /// Delay before retry number `retry` (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 1u32 << retry.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Runs `call` until it succeeds, fails with a non-retryable error, or
    /// attempts are exhausted. The last error is returned unchanged.
    pub async fn run<T, F, Fut>(&self, operation: &'static str, mut call: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt < max_attempts => {
                    let delay = self.delay_for(attempt);
                    tracing::warn!(
                        operation,
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "retrying store call"
                    );
                    metrics::counter!("projection_store_retries_total", "operation" => operation)
                        .increment(1);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(100), Duration::from_secs(2))
    }
}

/// Wraps a store so every call is retried according to a [`RetryPolicy`].
#[derive(Clone)]
pub struct RetryingStore<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S: ProjectionStore> RetryingStore<S> {
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl<S: ProjectionStore> ProjectionStore for RetryingStore<S> {
    async fn init_occupancy(&self, city_id: CityId, date: NaiveDate) -> Result<bool> {
        self.policy
            .run("init_occupancy", || self.inner.init_occupancy(city_id, date))
            .await
    }

    async fn increment_occupancy(
        &self,
        city_id: CityId,
        date: NaiveDate,
        occupied_delta: i64,
        available_delta: i64,
    ) -> Result<Option<OccupancyCounter>> {
        self.policy
            .run("increment_occupancy", || {
                self.inner
                    .increment_occupancy(city_id, date, occupied_delta, available_delta)
            })
            .await
    }

    async fn get_occupancy(
        &self,
        city_id: CityId,
        date: NaiveDate,
    ) -> Result<Option<OccupancyCounter>> {
        self.policy
            .run("get_occupancy", || self.inner.get_occupancy(city_id, date))
            .await
    }

    async fn occupancy_range(
        &self,
        city_id: CityId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<OccupancyCounter>> {
        self.policy
            .run("occupancy_range", || {
                self.inner.occupancy_range(city_id, from, to)
            })
            .await
    }

    async fn upsert_availability(&self, flag: AvailabilityFlag) -> Result<()> {
        self.policy
            .run("upsert_availability", || self.inner.upsert_availability(flag))
            .await
    }

    async fn get_availability(
        &self,
        property_id: PropertyId,
        date: NaiveDate,
    ) -> Result<Option<AvailabilityFlag>> {
        self.policy
            .run("get_availability", || {
                self.inner.get_availability(property_id, date)
            })
            .await
    }

    async fn available_properties(
        &self,
        date: NaiveDate,
        city_id: Option<CityId>,
        limit: usize,
    ) -> Result<Vec<AvailabilityFlag>> {
        self.policy
            .run("available_properties", || {
                self.inner.available_properties(date, city_id, limit)
            })
            .await
    }

    async fn insert_host_reservation(&self, entry: HostReservationEntry) -> Result<()> {
        self.policy
            .run("insert_host_reservation", || {
                self.inner.insert_host_reservation(entry.clone())
            })
            .await
    }

    async fn delete_host_reservation(
        &self,
        host_id: HostId,
        date: NaiveDate,
        reservation_id: ReservationId,
    ) -> Result<bool> {
        self.policy
            .run("delete_host_reservation", || {
                self.inner
                    .delete_host_reservation(host_id, date, reservation_id)
            })
            .await
    }

    async fn host_reservations(
        &self,
        host_id: HostId,
        date: NaiveDate,
        limit: usize,
    ) -> Result<Vec<HostReservationEntry>> {
        self.policy
            .run("host_reservations", || {
                self.inner.host_reservations(host_id, date, limit)
            })
            .await
    }

    async fn insert_city_reservation(&self, entry: CityReservationEntry) -> Result<()> {
        self.policy
            .run("insert_city_reservation", || {
                self.inner.insert_city_reservation(entry.clone())
            })
            .await
    }

    async fn delete_city_reservation(
        &self,
        city_id: CityId,
        date: NaiveDate,
        reservation_id: ReservationId,
    ) -> Result<bool> {
        self.policy
            .run("delete_city_reservation", || {
                self.inner
                    .delete_city_reservation(city_id, date, reservation_id)
            })
            .await
    }

    async fn city_reservations(
        &self,
        city_id: CityId,
        date: NaiveDate,
        limit: usize,
    ) -> Result<Vec<CityReservationEntry>> {
        self.policy
            .run("city_reservations", || {
                self.inner.city_reservations(city_id, date, limit)
            })
            .await
    }
}

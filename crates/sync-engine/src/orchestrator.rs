//! Entry points for synchronizing lifecycle events.

use std::time::Instant;

use chrono::NaiveDate;
use common::{CityId, GuestId, HostId, Money, PropertyId, ReservationId};
use domain::{
    AvailabilityGenerated, EventKind, ReservationCancelled, ReservationCreated,
    ReservationLifecycleEvent, StayRange,
};
use projection_store::ProjectionStore;

use crate::config::SyncConfig;
use crate::error::Result;
use crate::executor::SyncExecutor;
use crate::report::SyncReport;
use crate::worker::SyncWorkerPool;

/// Keeps the projections in step with committed reservation changes.
///
/// Only validation errors reach the caller. Store failures are logged with
/// the event's context and listed in the returned [`SyncReport`]; the primary
/// transaction has already committed and is never affected by them.
pub struct SyncOrchestrator<S> {
    executor: SyncExecutor<S>,
    workers: SyncWorkerPool,
    config: SyncConfig,
}

impl<S> SyncOrchestrator<S>
where
    S: ProjectionStore + Clone + 'static,
{
    /// Creates an orchestrator over a shared store handle.
    ///
    /// Spawns the background workers, so this must run inside a tokio runtime.
    pub fn new(store: S, config: SyncConfig) -> Self {
        let executor = SyncExecutor::new(store, config.effective_concurrency());
        let workers = SyncWorkerPool::start(executor.clone(), &config);
        Self {
            executor,
            workers,
            config,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// The background pool that runs large onboarding horizons.
    pub fn workers(&self) -> &SyncWorkerPool {
        &self.workers
    }

    /// Stops the background workers after the queued jobs finish.
    pub async fn shutdown(&self) {
        self.workers.shutdown().await;
    }

    /// Records a newly committed reservation in every projection.
    #[allow(clippy::too_many_arguments)]
    pub async fn sync_reservation_created(
        &self,
        city_id: CityId,
        host_id: HostId,
        property_id: PropertyId,
        guest_id: GuestId,
        reservation_id: ReservationId,
        check_in: NaiveDate,
        check_out: NaiveDate,
        amount: Money,
    ) -> Result<SyncReport> {
        let stay = StayRange::new(check_in, check_out)?;
        let event = ReservationLifecycleEvent::created(ReservationCreated {
            reservation_id,
            city_id,
            host_id,
            property_id,
            guest_id,
            stay,
            amount,
        });
        self.handle(event).await
    }

    /// Reverts a cancelled reservation's effect on every projection.
    pub async fn sync_reservation_cancelled(
        &self,
        city_id: CityId,
        host_id: HostId,
        property_id: PropertyId,
        reservation_id: ReservationId,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> Result<SyncReport> {
        let stay = StayRange::new(check_in, check_out)?;
        let event = ReservationLifecycleEvent::cancelled(ReservationCancelled {
            reservation_id,
            city_id,
            host_id,
            property_id,
            stay,
        });
        self.handle(event).await
    }

    /// Opens the calendar of a newly listed property.
    ///
    /// Horizons above the background threshold return a deferred report.
    pub async fn sync_availability_generated(
        &self,
        city_id: CityId,
        property_id: PropertyId,
        start_date: NaiveDate,
        num_days: u32,
    ) -> Result<SyncReport> {
        let event = ReservationLifecycleEvent::availability_generated(AvailabilityGenerated {
            city_id,
            property_id,
            start_date,
            num_days,
        })?;
        self.handle(event).await
    }

    /// Handles a post-commit lifecycle event.
    #[tracing::instrument(
        skip(self, event),
        fields(
            event_id = %event.event_id,
            kind = %event.kind(),
            reservation_id = ?event.reservation_id(),
            nights = event.night_count(),
        )
    )]
    pub async fn handle(&self, event: ReservationLifecycleEvent) -> Result<SyncReport> {
        event.validate()?;
        metrics::counter!("sync_events_total", "kind" => event.kind().as_str()).increment(1);

        if self.should_defer(&event) {
            match self.workers.submit(event.clone()) {
                Ok(ticket) => {
                    metrics::counter!("sync_events_deferred_total").increment(1);
                    tracing::info!(job_id = %ticket.job_id(), "event deferred to background");
                    return Ok(SyncReport::deferred(&event, ticket.job_id()));
                }
                Err(_) => {
                    tracing::warn!("background queue unavailable, syncing inline");
                }
            }
        }

        let start = Instant::now();
        let report = self.executor.execute(&event).await;
        let duration = start.elapsed().as_secs_f64();
        metrics::histogram!("sync_duration_seconds").record(duration);

        if report.failed.is_empty() {
            tracing::info!(writes = report.writes_attempted, duration, "event synced");
        } else {
            tracing::warn!(
                writes = report.writes_attempted,
                failed = report.failed.len(),
                duration,
                "event synced with failed writes"
            );
        }
        Ok(report)
    }

    fn should_defer(&self, event: &ReservationLifecycleEvent) -> bool {
        event.kind() == EventKind::AvailabilityGenerated
            && event.night_count() > self.config.background_threshold_nights
    }
}

//! Applies planned writes to the projections.

use common::{EventId, ReservationId};
use domain::{EventKind, ReservationLifecycleEvent};
use futures_util::{StreamExt, stream};
use projection_store::ProjectionStore;
use projections::{
    AvailabilityFlags, CityReservationIndex, HostReservationIndex, OccupancyLedger, Projection,
};

use crate::plan::{ProjectionWrite, SyncPlan};
use crate::report::{FailedWrite, SyncReport};
use crate::state::SyncState;

/// Identifies the event a write belongs to, for failure logs.
#[derive(Debug, Clone, Copy)]
pub struct WriteContext {
    pub event_id: EventId,
    pub kind: EventKind,
    pub reservation_id: Option<ReservationId>,
}

impl WriteContext {
    pub fn of(event: &ReservationLifecycleEvent) -> Self {
        Self {
            event_id: event.event_id,
            kind: event.kind(),
            reservation_id: event.reservation_id(),
        }
    }
}

/// Runs a [`SyncPlan`] against the projections.
///
/// Shared by the inline path and the background workers.
#[derive(Clone)]
pub struct SyncExecutor<S> {
    ledger: OccupancyLedger<S>,
    flags: AvailabilityFlags<S>,
    host_index: HostReservationIndex<S>,
    city_index: CityReservationIndex<S>,
    max_concurrency: usize,
}

impl<S> SyncExecutor<S>
where
    S: ProjectionStore + Clone,
{
    pub fn new(store: S, max_concurrency: usize) -> Self {
        Self {
            ledger: OccupancyLedger::new(store.clone()),
            flags: AvailabilityFlags::new(store.clone()),
            host_index: HostReservationIndex::new(store.clone()),
            city_index: CityReservationIndex::new(store),
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// Expands the event and drives it through every stage to a terminal state.
    #[tracing::instrument(skip(self, event), fields(event_id = %event.event_id, kind = %event.kind()))]
    pub async fn execute(&self, event: &ReservationLifecycleEvent) -> SyncReport {
        let ctx = WriteContext::of(event);
        let mut state = SyncState::Received;

        advance(&mut state, SyncState::Expanding);
        let plan = SyncPlan::for_event(event);
        let [occupancy, availability, reservation_index] = plan.stages();

        advance(&mut state, SyncState::PerNightSync);
        let mut failed = self.run_stage(occupancy.0, occupancy.1, &ctx).await;
        failed.extend(self.run_stage(availability.0, availability.1, &ctx).await);

        advance(&mut state, SyncState::HostIndexSync);
        failed.extend(
            self.run_stage(reservation_index.0, reservation_index.1, &ctx)
                .await,
        );

        let terminal = if failed.is_empty() {
            SyncState::Completed
        } else {
            SyncState::PartiallyFailed
        };
        advance(&mut state, terminal);

        SyncReport::finished(
            event,
            plan.night_count(),
            plan.write_count(),
            failed,
            state,
        )
    }

    /// Runs previously failed writes again, in their original order.
    ///
    /// Returns the writes that failed again.
    pub async fn replay(&self, failed: Vec<FailedWrite>, ctx: &WriteContext) -> Vec<FailedWrite> {
        let writes: Vec<ProjectionWrite> = failed.into_iter().map(|f| f.write).collect();
        self.run_stage("replay", &writes, ctx).await
    }

    /// Applies a single write.
    pub async fn apply(&self, write: &ProjectionWrite) -> projections::Result<()> {
        match write {
            ProjectionWrite::Occupancy {
                city_id,
                date,
                delta,
            } => self
                .ledger
                .apply_delta(*city_id, *date, *delta)
                .await
                .map(|_| ()),
            ProjectionWrite::Availability {
                property_id,
                city_id,
                date,
                available,
            } => {
                self.flags
                    .set_available(*property_id, *city_id, *date, *available)
                    .await
            }
            ProjectionWrite::HostInsert {
                host_id,
                check_in,
                reservation,
            } => self.host_index.insert(*host_id, *check_in, *reservation).await,
            ProjectionWrite::HostRemove {
                host_id,
                check_in,
                reservation_id,
            } => self
                .host_index
                .remove(*host_id, *check_in, *reservation_id)
                .await
                .map(|_| ()),
            ProjectionWrite::CityInsert {
                city_id,
                check_in,
                reservation,
            } => self.city_index.insert(*city_id, *check_in, *reservation).await,
            ProjectionWrite::CityRemove {
                city_id,
                check_in,
                reservation_id,
            } => self
                .city_index
                .remove(*city_id, *check_in, *reservation_id)
                .await
                .map(|_| ()),
        }
    }

    fn projection_of(&self, write: &ProjectionWrite) -> &dyn Projection {
        match write {
            ProjectionWrite::Occupancy { .. } => &self.ledger,
            ProjectionWrite::Availability { .. } => &self.flags,
            ProjectionWrite::HostInsert { .. } | ProjectionWrite::HostRemove { .. } => {
                &self.host_index
            }
            ProjectionWrite::CityInsert { .. } | ProjectionWrite::CityRemove { .. } => {
                &self.city_index
            }
        }
    }

    /// Applies a stage's writes with bounded concurrency.
    ///
    /// Writes start in list order; a failure never stops the remaining writes.
    async fn run_stage(
        &self,
        stage: &'static str,
        writes: &[ProjectionWrite],
        ctx: &WriteContext,
    ) -> Vec<FailedWrite> {
        if writes.is_empty() {
            return Vec::new();
        }
        tracing::debug!(stage, writes = writes.len(), "sync stage started");

        let results: Vec<_> = stream::iter(writes.iter().cloned())
            .map(|write| async move {
                let result = self.apply(&write).await;
                (write, result)
            })
            .buffered(self.max_concurrency)
            .collect()
            .await;

        let mut failed = Vec::new();
        for (write, result) in results {
            if let Err(err) = result {
                tracing::error!(
                    event_id = %ctx.event_id,
                    kind = %ctx.kind,
                    reservation_id = ?ctx.reservation_id,
                    date = %write.date(),
                    operation = write.operation(),
                    collection = self.projection_of(&write).collection(),
                    error = %err,
                    "projection write failed"
                );
                metrics::counter!("sync_write_failures_total", "operation" => write.operation())
                    .increment(1);
                failed.push(FailedWrite::new(write, &err));
            }
        }
        failed
    }
}

fn advance(state: &mut SyncState, next: SyncState) {
    debug_assert!(
        state.can_advance_to(next),
        "illegal sync transition {state} -> {next}"
    );
    tracing::debug!(from = %state, to = %next, "sync state advanced");
    *state = next;
}

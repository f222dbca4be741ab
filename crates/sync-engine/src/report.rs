//! Outcome of synchronizing one lifecycle event.

use chrono::NaiveDate;
use common::{EventId, ReservationId};
use domain::{EventKind, ReservationLifecycleEvent};
use projections::ProjectionError;
use serde::{Deserialize, Serialize};

use crate::plan::ProjectionWrite;
use crate::state::SyncState;
use crate::worker::JobId;

/// A write that did not reach the secondary store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedWrite {
    pub write: ProjectionWrite,
    pub error: String,
    pub retryable: bool,
}

impl FailedWrite {
    pub fn new(write: ProjectionWrite, error: &ProjectionError) -> Self {
        Self {
            write,
            error: error.to_string(),
            retryable: error.is_retryable(),
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.write.date()
    }

    pub fn operation(&self) -> &'static str {
        self.write.operation()
    }
}

/// How far an event got.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyncOutcome {
    Completed,
    PartiallyFailed,
    /// Handed to the background workers; the job reports its own outcome.
    Deferred { job_id: JobId },
}

/// Summary of one sync run, returned to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncReport {
    pub event_id: EventId,
    pub kind: EventKind,
    pub reservation_id: Option<ReservationId>,
    pub nights: usize,
    pub writes_attempted: usize,
    pub failed: Vec<FailedWrite>,
    pub outcome: SyncOutcome,
}

impl SyncReport {
    pub(crate) fn finished(
        event: &ReservationLifecycleEvent,
        nights: usize,
        writes_attempted: usize,
        failed: Vec<FailedWrite>,
        state: SyncState,
    ) -> Self {
        let outcome = match state {
            SyncState::Completed => SyncOutcome::Completed,
            _ => SyncOutcome::PartiallyFailed,
        };
        Self {
            event_id: event.event_id,
            kind: event.kind(),
            reservation_id: event.reservation_id(),
            nights,
            writes_attempted,
            failed,
            outcome,
        }
    }

    pub(crate) fn deferred(event: &ReservationLifecycleEvent, job_id: JobId) -> Self {
        Self {
            event_id: event.event_id,
            kind: event.kind(),
            reservation_id: event.reservation_id(),
            nights: event.night_count() as usize,
            writes_attempted: 0,
            failed: Vec::new(),
            outcome: SyncOutcome::Deferred { job_id },
        }
    }

    /// Whether the caller should treat the event as handled.
    ///
    /// Failed writes are logged and listed in the report, but never turn the
    /// event itself into a failure.
    pub fn is_success(&self) -> bool {
        match self.outcome {
            SyncOutcome::Completed | SyncOutcome::PartiallyFailed | SyncOutcome::Deferred { .. } => {
                true
            }
        }
    }

    /// Returns true if every planned write has landed.
    pub fn is_complete(&self) -> bool {
        self.outcome == SyncOutcome::Completed && self.failed.is_empty()
    }

    /// The terminal state reached, or `None` while deferred.
    pub fn final_state(&self) -> Option<SyncState> {
        match self.outcome {
            SyncOutcome::Completed => Some(SyncState::Completed),
            SyncOutcome::PartiallyFailed => Some(SyncState::PartiallyFailed),
            SyncOutcome::Deferred { .. } => None,
        }
    }

    /// Distinct dates with at least one failed write, ascending.
    pub fn failed_dates(&self) -> Vec<NaiveDate> {
        let mut dates: Vec<NaiveDate> = self.failed.iter().map(FailedWrite::date).collect();
        dates.sort();
        dates.dedup();
        dates
    }

    pub(crate) fn settle(&mut self) {
        self.outcome = if self.failed.is_empty() {
            SyncOutcome::Completed
        } else {
            SyncOutcome::PartiallyFailed
        };
    }
}

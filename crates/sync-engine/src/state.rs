//! Per-event sync state machine.

use serde::{Deserialize, Serialize};

/// The state of one lifecycle event as it moves through synchronization.
///
/// State transitions:
/// ```text
/// Received ──► Expanding ──► PerNightSync ──► HostIndexSync ──┬──► Completed
///                                                             └──► PartiallyFailed
/// ```
///
/// Both terminal states are observational; the caller sees success either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SyncState {
    /// The event has been accepted and validated.
    #[default]
    Received,

    /// The stay or horizon is being turned into its nights.
    Expanding,

    /// Occupancy and availability writes are in flight.
    PerNightSync,

    /// The host reservation index is being updated.
    HostIndexSync,

    /// Every write succeeded (terminal state).
    Completed,

    /// At least one write failed and was logged (terminal state).
    PartiallyFailed,
}

impl SyncState {
    /// Returns true if `next` directly follows this state.
    pub fn can_advance_to(&self, next: SyncState) -> bool {
        matches!(
            (self, next),
            (SyncState::Received, SyncState::Expanding)
                | (SyncState::Expanding, SyncState::PerNightSync)
                | (SyncState::PerNightSync, SyncState::HostIndexSync)
                | (SyncState::HostIndexSync, SyncState::Completed)
                | (SyncState::HostIndexSync, SyncState::PartiallyFailed)
        )
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SyncState::Completed | SyncState::PartiallyFailed)
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncState::Received => "Received",
            SyncState::Expanding => "Expanding",
            SyncState::PerNightSync => "PerNightSync",
            SyncState::HostIndexSync => "HostIndexSync",
            SyncState::Completed => "Completed",
            SyncState::PartiallyFailed => "PartiallyFailed",
        }
    }
}

impl std::fmt::Display for SyncState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

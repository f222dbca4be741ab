//! Sync error types.

use domain::DomainError;
use thiserror::Error;

/// Errors surfaced to the caller of a sync operation.
///
/// Secondary-store failures are never surfaced here; they end up in the
/// [`SyncReport`](crate::SyncReport) instead.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The event was rejected before any night was expanded.
    #[error("Validation error: {0}")]
    Validation(#[from] DomainError),
}

/// Convenience type alias for sync results.
pub type Result<T> = std::result::Result<T, SyncError>;

//! Synchronization of reservation lifecycle events into projections.
//!
//! Each event is expanded into its nights and fanned out into three stages:
//! 1. Occupancy counter deltas, one per night
//! 2. Availability flag writes, one per night
//! 3. The host and city reservation index entries at check-in
//!
//! Failed writes are logged and reported, never raised. Large onboarding
//! horizons are handed to a background [`SyncWorkerPool`].

pub mod config;
pub mod error;
pub mod executor;
pub mod orchestrator;
pub mod plan;
pub mod report;
pub mod state;
pub mod worker;

pub use config::SyncConfig;
pub use error::{Result, SyncError};
pub use executor::SyncExecutor;
pub use orchestrator::SyncOrchestrator;
pub use plan::{ProjectionWrite, SyncPlan};
pub use report::{FailedWrite, SyncOutcome, SyncReport};
pub use state::SyncState;
pub use worker::{DeadLetter, JobId, JobStatus, JobTicket, SyncWorkerPool};

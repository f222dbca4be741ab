//! Reservation lifecycle domain for projection synchronization.
//!
//! This crate provides:
//! - [`StayRange`] and [`expand_nights`] for turning a stay into its nights
//! - [`ReservationLifecycleEvent`], the post-commit notification consumed by the sync engine

pub mod error;
pub mod event;
pub mod stay;

pub use error::{DomainError, Result};
pub use event::{
    AvailabilityGenerated, EventKind, LifecycleChange, ReservationCancelled, ReservationCreated,
    ReservationLifecycleEvent, ReservationStatus,
};
pub use stay::{MAX_NIGHTS_PER_EVENT, StayRange, expand_nights, onboarding_horizon};

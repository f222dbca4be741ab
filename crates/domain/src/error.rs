//! Domain error types.

use chrono::NaiveDate;
use thiserror::Error;

/// Errors raised while building lifecycle events.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// The check-out date is not strictly after the check-in date.
    #[error("Invalid stay range: check-out {check_out} must be after check-in {check_in}")]
    InvalidStayRange {
        check_in: NaiveDate,
        check_out: NaiveDate,
    },

    /// A single event covers more nights than one sync run may fan out over.
    #[error("Event covers {nights} nights, more than the limit of {max}")]
    TooManyNights { nights: i64, max: u32 },

    /// The onboarding horizon runs past the last representable date.
    #[error("Onboarding horizon of {num_days} days from {start} overflows the calendar")]
    HorizonOverflow { start: NaiveDate, num_days: u32 },
}

/// Result type for domain operations.
pub type Result<T> = std::result::Result<T, DomainError>;

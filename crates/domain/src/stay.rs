//! Stay date ranges and night expansion.
//!
//! A stay covers the half-open interval `[check_in, check_out)`: the guest
//! occupies the night of every date from check-in up to, but not including,
//! check-out.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, Result};

/// Upper bound on the nights a single lifecycle event may cover, about three years.
pub const MAX_NIGHTS_PER_EVENT: u32 = 1096;

/// Rejects night counts above [`MAX_NIGHTS_PER_EVENT`].
pub(crate) fn check_night_count(nights: i64) -> Result<()> {
    if nights > i64::from(MAX_NIGHTS_PER_EVENT) {
        return Err(DomainError::TooManyNights {
            nights,
            max: MAX_NIGHTS_PER_EVENT,
        });
    }
    Ok(())
}

/// Expands `[check_in, check_out)` into its nights in ascending order.
///
/// Returns an empty vector when `check_out <= check_in`. Callers validate
/// ranges up front through [`StayRange::new`]; this function never fails.
pub fn expand_nights(check_in: NaiveDate, check_out: NaiveDate) -> Vec<NaiveDate> {
    check_in
        .iter_days()
        .take_while(|night| *night < check_out)
        .collect()
}

/// Returns `num_days` consecutive dates starting at `start`.
pub fn onboarding_horizon(start: NaiveDate, num_days: u32) -> Vec<NaiveDate> {
    start.iter_days().take(num_days as usize).collect()
}

/// A validated check-in/check-out pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawStay")]
pub struct StayRange {
    check_in: NaiveDate,
    check_out: NaiveDate,
}

impl StayRange {
    /// Creates a stay range, rejecting `check_out <= check_in` and stays
    /// longer than [`MAX_NIGHTS_PER_EVENT`].
    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> Result<Self> {
        if check_out <= check_in {
            return Err(DomainError::InvalidStayRange {
                check_in,
                check_out,
            });
        }
        check_night_count((check_out - check_in).num_days())?;
        Ok(Self {
            check_in,
            check_out,
        })
    }

    /// First night of the stay.
    pub fn check_in(&self) -> NaiveDate {
        self.check_in
    }

    /// Departure date; not itself a night of the stay.
    pub fn check_out(&self) -> NaiveDate {
        self.check_out
    }

    /// Number of nights covered.
    pub fn night_count(&self) -> u32 {
        (self.check_out - self.check_in).num_days() as u32
    }

    /// Every night of the stay, ascending.
    pub fn nights(&self) -> Vec<NaiveDate> {
        expand_nights(self.check_in, self.check_out)
    }
}

impl std::fmt::Display for StayRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.check_in, self.check_out)
    }
}

#[derive(Deserialize)]
struct RawStay {
    check_in: NaiveDate,
    check_out: NaiveDate,
}

impl TryFrom<RawStay> for StayRange {
    type Error = DomainError;

    fn try_from(raw: RawStay) -> Result<Self> {
        StayRange::new(raw.check_in, raw.check_out)
    }
}

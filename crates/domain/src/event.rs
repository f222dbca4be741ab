//! Reservation lifecycle events emitted after the primary store commits.

use chrono::{DateTime, Days, NaiveDate, Utc};
use common::{CityId, EventId, GuestId, HostId, Money, PropertyId, ReservationId};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, Result};
use crate::stay::{StayRange, check_night_count, onboarding_horizon};

/// The kind of change a lifecycle event carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Created,
    Cancelled,
    AvailabilityGenerated,
}

impl EventKind {
    /// Returns the kind as a static label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Created => "created",
            EventKind::Cancelled => "cancelled",
            EventKind::AvailabilityGenerated => "availability_generated",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status recorded on reservation index rows.
///
/// Cancellation deletes the indexed rows, so only confirmed reservations are
/// ever stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    #[default]
    Confirmed,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Confirmed => "confirmed",
        }
    }
}

impl std::str::FromStr for ReservationStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "confirmed" => Ok(ReservationStatus::Confirmed),
            other => Err(format!("unknown reservation status '{other}'")),
        }
    }
}

/// Data for a committed reservation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationCreated {
    pub reservation_id: ReservationId,
    pub city_id: CityId,
    pub host_id: HostId,
    pub property_id: PropertyId,
    pub guest_id: GuestId,
    #[serde(flatten)]
    pub stay: StayRange,
    pub amount: Money,
}

/// Data for a cancelled reservation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationCancelled {
    pub reservation_id: ReservationId,
    pub city_id: CityId,
    pub host_id: HostId,
    pub property_id: PropertyId,
    #[serde(flatten)]
    pub stay: StayRange,
}

/// Data for the initial calendar of a newly listed property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityGenerated {
    pub city_id: CityId,
    pub property_id: PropertyId,
    pub start_date: NaiveDate,
    pub num_days: u32,
}

/// The change carried by a lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LifecycleChange {
    Created(ReservationCreated),
    Cancelled(ReservationCancelled),
    AvailabilityGenerated(AvailabilityGenerated),
}

/// A post-commit notification from the primary store's transaction boundary.
///
/// Delivery is at-least-once. The `event_id` identifies one delivery and is
/// generated when the callback payload omits it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationLifecycleEvent {
    #[serde(default)]
    pub event_id: EventId,
    #[serde(default = "Utc::now")]
    pub occurred_at: DateTime<Utc>,
    #[serde(flatten)]
    pub change: LifecycleChange,
}

impl ReservationLifecycleEvent {
    /// Wraps a change in a fresh event envelope.
    pub fn new(change: LifecycleChange) -> Self {
        Self {
            event_id: EventId::new(),
            occurred_at: Utc::now(),
            change,
        }
    }

    pub fn created(data: ReservationCreated) -> Self {
        Self::new(LifecycleChange::Created(data))
    }

    pub fn cancelled(data: ReservationCancelled) -> Self {
        Self::new(LifecycleChange::Cancelled(data))
    }

    /// Builds an onboarding event, rejecting horizons that are too long or
    /// overflow the calendar.
    pub fn availability_generated(data: AvailabilityGenerated) -> Result<Self> {
        let event = Self::new(LifecycleChange::AvailabilityGenerated(data));
        event.validate()?;
        Ok(event)
    }

    /// Checks invariants that deserialization alone cannot enforce.
    ///
    /// Stay ranges are validated when they are built; onboarding horizons are
    /// checked here.
    pub fn validate(&self) -> Result<()> {
        let LifecycleChange::AvailabilityGenerated(data) = &self.change else {
            return Ok(());
        };
        check_night_count(i64::from(data.num_days))?;
        if data
            .start_date
            .checked_add_days(Days::new(u64::from(data.num_days)))
            .is_none()
        {
            return Err(DomainError::HorizonOverflow {
                start: data.start_date,
                num_days: data.num_days,
            });
        }
        Ok(())
    }

    pub fn kind(&self) -> EventKind {
        match &self.change {
            LifecycleChange::Created(_) => EventKind::Created,
            LifecycleChange::Cancelled(_) => EventKind::Cancelled,
            LifecycleChange::AvailabilityGenerated(_) => EventKind::AvailabilityGenerated,
        }
    }

    /// The reservation this event concerns; `None` for onboarding events.
    pub fn reservation_id(&self) -> Option<ReservationId> {
        match &self.change {
            LifecycleChange::Created(data) => Some(data.reservation_id),
            LifecycleChange::Cancelled(data) => Some(data.reservation_id),
            LifecycleChange::AvailabilityGenerated(_) => None,
        }
    }

    pub fn city_id(&self) -> CityId {
        match &self.change {
            LifecycleChange::Created(data) => data.city_id,
            LifecycleChange::Cancelled(data) => data.city_id,
            LifecycleChange::AvailabilityGenerated(data) => data.city_id,
        }
    }

    pub fn property_id(&self) -> PropertyId {
        match &self.change {
            LifecycleChange::Created(data) => data.property_id,
            LifecycleChange::Cancelled(data) => data.property_id,
            LifecycleChange::AvailabilityGenerated(data) => data.property_id,
        }
    }

    /// The nights this event fans out over, ascending.
    pub fn nights(&self) -> Vec<NaiveDate> {
        match &self.change {
            LifecycleChange::Created(data) => data.stay.nights(),
            LifecycleChange::Cancelled(data) => data.stay.nights(),
            LifecycleChange::AvailabilityGenerated(data) => {
                onboarding_horizon(data.start_date, data.num_days)
            }
        }
    }

    pub fn night_count(&self) -> u32 {
        match &self.change {
            LifecycleChange::Created(data) => data.stay.night_count(),
            LifecycleChange::Cancelled(data) => data.stay.night_count(),
            LifecycleChange::AvailabilityGenerated(data) => data.num_days,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn created() -> ReservationCreated {
        ReservationCreated {
            reservation_id: ReservationId::new(100),
            city_id: CityId::new(1),
            host_id: HostId::new(5),
            property_id: PropertyId::new(10),
            guest_id: GuestId::new(77),
            stay: StayRange::new(date(2025, 6, 1), date(2025, 6, 4)).unwrap(),
            amount: Money::from_cents(45_000),
        }
    }

    #[test]
    fn accessors_follow_the_change() {
        let event = ReservationLifecycleEvent::created(created());
        assert_eq!(event.kind(), EventKind::Created);
        assert_eq!(event.reservation_id(), Some(ReservationId::new(100)));
        assert_eq!(event.city_id(), CityId::new(1));
        assert_eq!(event.property_id(), PropertyId::new(10));
        assert_eq!(event.night_count(), 3);
        assert_eq!(event.nights().first(), Some(&date(2025, 6, 1)));
    }

    #[test]
    fn onboarding_event_uses_horizon() {
        let event = ReservationLifecycleEvent::availability_generated(AvailabilityGenerated {
            city_id: CityId::new(2),
            property_id: PropertyId::new(20),
            start_date: date(2025, 7, 1),
            num_days: 5,
        })
        .unwrap();
        assert_eq!(event.kind(), EventKind::AvailabilityGenerated);
        assert_eq!(event.reservation_id(), None);
        assert_eq!(event.nights().len(), 5);
    }

    #[test]
    fn onboarding_event_rejects_overflowing_horizon() {
        let result = ReservationLifecycleEvent::availability_generated(AvailabilityGenerated {
            city_id: CityId::new(2),
            property_id: PropertyId::new(20),
            start_date: NaiveDate::MAX,
            num_days: 2,
        });
        assert!(matches!(result, Err(DomainError::HorizonOverflow { .. })));
    }

    #[test]
    fn onboarding_event_rejects_horizon_over_the_night_limit() {
        let result = ReservationLifecycleEvent::availability_generated(AvailabilityGenerated {
            city_id: CityId::new(2),
            property_id: PropertyId::new(20),
            start_date: date(2025, 7, 1),
            num_days: crate::MAX_NIGHTS_PER_EVENT + 1,
        });
        assert!(matches!(result, Err(DomainError::TooManyNights { .. })));
    }

    #[test]
    fn deserialized_huge_horizon_fails_validation() {
        let json = r#"{
            "kind": "availability_generated",
            "city_id": 2,
            "property_id": 20,
            "start_date": "2025-07-01",
            "num_days": 50000000
        }"#;
        let event: ReservationLifecycleEvent = serde_json::from_str(json).unwrap();
        assert_eq!(
            event.validate(),
            Err(DomainError::TooManyNights {
                nights: 50_000_000,
                max: crate::MAX_NIGHTS_PER_EVENT,
            })
        );
    }

    #[test]
    fn deserializes_flat_callback_payload() {
        let json = r#"{
            "kind": "created",
            "reservation_id": 100,
            "city_id": 1,
            "host_id": 5,
            "property_id": 10,
            "guest_id": 77,
            "check_in": "2025-06-01",
            "check_out": "2025-06-04",
            "amount": 45000
        }"#;
        let event: ReservationLifecycleEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.change, LifecycleChange::Created(created()));
    }

    #[test]
    fn deserialization_rejects_inverted_stay() {
        let json = r#"{
            "kind": "cancelled",
            "reservation_id": 100,
            "city_id": 1,
            "host_id": 5,
            "property_id": 10,
            "check_in": "2025-06-04",
            "check_out": "2025-06-01"
        }"#;
        assert!(serde_json::from_str::<ReservationLifecycleEvent>(json).is_err());
    }

    #[test]
    fn serialized_event_keeps_its_id() {
        let event = ReservationLifecycleEvent::created(created());
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "created");
        assert_eq!(json["check_in"], "2025-06-01");
        let back: ReservationLifecycleEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back.event_id, event.event_id);
    }

    #[test]
    fn status_parses_from_label() {
        assert_eq!(
            "confirmed".parse::<ReservationStatus>().unwrap(),
            ReservationStatus::Confirmed
        );
        assert!("cancelled".parse::<ReservationStatus>().is_err());
    }
}

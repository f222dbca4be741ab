//! Fan-out of a lifecycle event into projection writes.

use chrono::NaiveDate;
use common::{CityId, HostId, PropertyId, ReservationId};
use domain::{LifecycleChange, ReservationLifecycleEvent};
use projections::{CityReservation, HostReservation, OccupancyDelta};
use serde::{Deserialize, Serialize};

/// A single write against one projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum ProjectionWrite {
    Occupancy {
        city_id: CityId,
        date: NaiveDate,
        delta: OccupancyDelta,
    },
    Availability {
        property_id: PropertyId,
        city_id: CityId,
        date: NaiveDate,
        available: bool,
    },
    HostInsert {
        host_id: HostId,
        check_in: NaiveDate,
        reservation: HostReservation,
    },
    HostRemove {
        host_id: HostId,
        check_in: NaiveDate,
        reservation_id: ReservationId,
    },
    CityInsert {
        city_id: CityId,
        check_in: NaiveDate,
        reservation: CityReservation,
    },
    CityRemove {
        city_id: CityId,
        check_in: NaiveDate,
        reservation_id: ReservationId,
    },
}

impl ProjectionWrite {
    /// Name of the operation, used in logs and metric labels.
    pub fn operation(&self) -> &'static str {
        match self {
            ProjectionWrite::Occupancy { .. } => "occupancy_delta",
            ProjectionWrite::Availability { .. } => "set_availability",
            ProjectionWrite::HostInsert { .. } => "host_index_insert",
            ProjectionWrite::HostRemove { .. } => "host_index_remove",
            ProjectionWrite::CityInsert { .. } => "city_index_insert",
            ProjectionWrite::CityRemove { .. } => "city_index_remove",
        }
    }

    /// The date this write is keyed on.
    pub fn date(&self) -> NaiveDate {
        match self {
            ProjectionWrite::Occupancy { date, .. } | ProjectionWrite::Availability { date, .. } => {
                *date
            }
            ProjectionWrite::HostInsert { check_in, .. }
            | ProjectionWrite::HostRemove { check_in, .. }
            | ProjectionWrite::CityInsert { check_in, .. }
            | ProjectionWrite::CityRemove { check_in, .. } => *check_in,
        }
    }
}

/// Every write one event produces, grouped into the stages they run in.
///
/// Stages run in order: occupancy, then availability, then the reservation
/// indexes (host, then city). Within a stage writes are listed in ascending
/// date order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncPlan {
    pub nights: Vec<NaiveDate>,
    pub occupancy: Vec<ProjectionWrite>,
    pub availability: Vec<ProjectionWrite>,
    pub reservation_index: Vec<ProjectionWrite>,
}

impl SyncPlan {
    /// Expands an event into its nights and the writes for each of them.
    pub fn for_event(event: &ReservationLifecycleEvent) -> Self {
        let city_id = event.city_id();
        let property_id = event.property_id();

        let (delta, available, reservation_index) = match &event.change {
            LifecycleChange::Created(data) => {
                let check_in = data.stay.check_in();
                let host_insert = ProjectionWrite::HostInsert {
                    host_id: data.host_id,
                    check_in,
                    reservation: HostReservation {
                        reservation_id: data.reservation_id,
                        property_id,
                        guest_id: data.guest_id,
                        amount: data.amount,
                    },
                };
                let city_insert = ProjectionWrite::CityInsert {
                    city_id,
                    check_in,
                    reservation: CityReservation {
                        reservation_id: data.reservation_id,
                        property_id,
                        host_id: data.host_id,
                        guest_id: data.guest_id,
                        amount: data.amount,
                    },
                };
                (OccupancyDelta::RESERVE, false, vec![host_insert, city_insert])
            }
            LifecycleChange::Cancelled(data) => {
                let check_in = data.stay.check_in();
                let host_remove = ProjectionWrite::HostRemove {
                    host_id: data.host_id,
                    check_in,
                    reservation_id: data.reservation_id,
                };
                let city_remove = ProjectionWrite::CityRemove {
                    city_id,
                    check_in,
                    reservation_id: data.reservation_id,
                };
                (OccupancyDelta::RELEASE, true, vec![host_remove, city_remove])
            }
            LifecycleChange::AvailabilityGenerated(_) => (OccupancyDelta::ONBOARD, true, Vec::new()),
        };

        let nights = event.nights();
        let occupancy = nights
            .iter()
            .map(|&date| ProjectionWrite::Occupancy {
                city_id,
                date,
                delta,
            })
            .collect();
        let availability = nights
            .iter()
            .map(|&date| ProjectionWrite::Availability {
                property_id,
                city_id,
                date,
                available,
            })
            .collect();
        Self {
            nights,
            occupancy,
            availability,
            reservation_index,
        }
    }

    /// The stages in execution order, paired with a label for logging.
    pub fn stages(&self) -> [(&'static str, &[ProjectionWrite]); 3] {
        [
            ("occupancy", self.occupancy.as_slice()),
            ("availability", self.availability.as_slice()),
            ("reservation_index", self.reservation_index.as_slice()),
        ]
    }

    pub fn night_count(&self) -> usize {
        self.nights.len()
    }

    /// Total writes across all stages; at most `2 * nights + 2`.
    pub fn write_count(&self) -> usize {
        self.occupancy.len() + self.availability.len() + self.reservation_index.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{GuestId, Money};
    use domain::{AvailabilityGenerated, ReservationCancelled, ReservationCreated, StayRange};

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    fn created(check_in: NaiveDate, check_out: NaiveDate) -> ReservationLifecycleEvent {
        ReservationLifecycleEvent::created(ReservationCreated {
            reservation_id: ReservationId::new(7),
            city_id: CityId::new(1),
            host_id: HostId::new(2),
            property_id: PropertyId::new(3),
            guest_id: GuestId::new(4),
            stay: StayRange::new(check_in, check_out).unwrap(),
            amount: Money::from_cents(45_050),
        })
    }

    #[test]
    fn test_created_plan() {
        let plan = SyncPlan::for_event(&created(date(3, 1), date(3, 4)));

        assert_eq!(plan.nights, vec![date(3, 1), date(3, 2), date(3, 3)]);
        assert_eq!(plan.write_count(), 8);
        assert!(plan.occupancy.iter().all(|w| matches!(
            w,
            ProjectionWrite::Occupancy { delta, .. } if *delta == OccupancyDelta::RESERVE
        )));
        assert!(plan.availability.iter().all(|w| matches!(
            w,
            ProjectionWrite::Availability { available: false, city_id, .. } if *city_id == CityId::new(1)
        )));
        match plan.reservation_index.as_slice() {
            [
                ProjectionWrite::HostInsert {
                    check_in,
                    reservation,
                    ..
                },
                ProjectionWrite::CityInsert {
                    city_id,
                    reservation: city_reservation,
                    ..
                },
            ] => {
                assert_eq!(*check_in, date(3, 1));
                assert_eq!(reservation.amount.cents(), 45_050);
                assert_eq!(*city_id, CityId::new(1));
                assert_eq!(city_reservation.host_id, HostId::new(2));
            }
            other => panic!("unexpected index writes: {other:?}"),
        }
    }

    #[test]
    fn test_cancelled_plan_mirrors_created() {
        let event = ReservationLifecycleEvent::cancelled(ReservationCancelled {
            reservation_id: ReservationId::new(7),
            city_id: CityId::new(1),
            host_id: HostId::new(2),
            property_id: PropertyId::new(3),
            stay: StayRange::new(date(3, 1), date(3, 4)).unwrap(),
        });
        let plan = SyncPlan::for_event(&event);

        assert_eq!(plan.write_count(), 8);
        assert!(plan.occupancy.iter().all(|w| matches!(
            w,
            ProjectionWrite::Occupancy { delta, .. } if *delta == OccupancyDelta::RELEASE
        )));
        assert!(plan.availability.iter().all(|w| matches!(
            w,
            ProjectionWrite::Availability { available: true, .. }
        )));
        assert!(matches!(
            plan.reservation_index.as_slice(),
            [
                ProjectionWrite::HostRemove { .. },
                ProjectionWrite::CityRemove { .. }
            ]
        ));
    }

    #[test]
    fn test_onboarding_plan_has_no_index_writes() {
        let event = ReservationLifecycleEvent::availability_generated(AvailabilityGenerated {
            city_id: CityId::new(1),
            property_id: PropertyId::new(3),
            start_date: date(1, 1),
            num_days: 365,
        })
        .unwrap();
        let plan = SyncPlan::for_event(&event);

        assert_eq!(plan.night_count(), 365);
        assert_eq!(plan.write_count(), 730);
        assert!(plan.reservation_index.is_empty());
        assert_eq!(plan.stages()[2].1.len(), 0);
    }

    #[test]
    fn test_stage_writes_are_ascending() {
        let plan = SyncPlan::for_event(&created(date(2, 26), date(3, 3)));
        for (_, writes) in plan.stages() {
            let dates: Vec<_> = writes.iter().map(ProjectionWrite::date).collect();
            let mut sorted = dates.clone();
            sorted.sort();
            assert_eq!(dates, sorted);
        }
    }

    #[test]
    fn test_operation_names() {
        let plan = SyncPlan::for_event(&created(date(3, 1), date(3, 2)));
        assert_eq!(plan.occupancy[0].operation(), "occupancy_delta");
        assert_eq!(plan.availability[0].operation(), "set_availability");
        let index_ops: Vec<_> = plan
            .reservation_index
            .iter()
            .map(ProjectionWrite::operation)
            .collect();
        assert_eq!(index_ops, vec!["host_index_insert", "city_index_insert"]);
    }
}

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Declares an integer-backed identifier for a primary-store entity.
///
/// Every entity the synchronization engine touches is keyed by the primary
/// store's `BIGINT` id; the newtype keeps a city id from being passed where a
/// property id is expected.
macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Creates an identifier from its raw primary-store value.
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// Returns the raw primary-store value.
            pub const fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

entity_id!(
    /// Identifier of a city; occupancy counters aggregate per city.
    CityId
);
entity_id!(
    /// Identifier of a rentable property.
    PropertyId
);
entity_id!(
    /// Identifier of the user hosting a property.
    HostId
);
entity_id!(
    /// Identifier of the guest who booked a stay.
    GuestId
);
entity_id!(
    /// Identifier of a reservation in the primary store.
    ReservationId
);

/// Unique identifier for one delivery of a lifecycle event.
///
/// Events are delivered at-least-once, so two deliveries of the same
/// reservation change carry different event ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(Uuid);

impl EventId {
    /// Creates a new random event ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an event ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for EventId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

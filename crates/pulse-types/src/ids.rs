//! Type-safe identifier wrappers around [`Uuid`].
//!
//! Every entity in the tracker has a strongly-typed ID to prevent
//! accidental mixing of identifiers at compile time -- an event id can
//! never be passed where a space id is expected, which matters in a
//! system whose whole job is moving events between spaces. All IDs use
//! UUID v7 (time-ordered) for efficient database indexing.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for a tracked space (room, hall, lab).
    SpaceId
}

define_id! {
    /// Unique identifier for a scheduled event.
    EventId
}

define_id! {
    /// Unique identifier for an occupancy observation.
    ObservationId
}

define_id! {
    /// Unique identifier for a stored occupancy prediction.
    PredictionId
}

define_id! {
    /// Unique identifier for a decision record in the audit log.
    DecisionId
}

define_id! {
    /// Unique identifier for a prediction-accuracy sample.
    SampleId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_distinct_types() {
        let space = SpaceId::new();
        let event = EventId::new();
        // These are different types -- the compiler enforces no mixing.
        assert_ne!(space.into_inner(), Uuid::nil());
        assert_ne!(event.into_inner(), Uuid::nil());
    }

    #[test]
    fn id_roundtrip_serde() {
        let original = SpaceId::new();
        let json = serde_json::to_string(&original).ok();
        assert!(json.is_some());
        let restored: Result<SpaceId, _> = serde_json::from_str(json.as_deref().unwrap_or(""));
        assert!(restored.is_ok());
    }

    #[test]
    fn id_display_matches_uuid() {
        let id = SpaceId::new();
        assert_eq!(id.to_string(), id.into_inner().to_string());
    }

    #[test]
    fn v7_ids_are_time_ordered() {
        let earlier = DecisionId::new();
        let later = DecisionId::new();
        assert!(earlier <= later);
    }
}

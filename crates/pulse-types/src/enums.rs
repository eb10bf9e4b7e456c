//! Enumeration types for the `PulseCampus` occupancy tracker.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Space categories
// ---------------------------------------------------------------------------

/// The category of a tracked space.
///
/// Categories carry no behavior in the decision core -- capacity is what
/// matters -- but they are preserved end to end for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpaceType {
    /// A teaching room with fixed seating.
    Classroom,
    /// A large multi-purpose hall.
    Hall,
    /// A library or reading room.
    Library,
    /// A laboratory with equipment stations.
    Lab,
    /// A tiered auditorium.
    Auditorium,
    /// Anything that does not fit the categories above.
    Other,
}

impl SpaceType {
    /// Database string representation of this category.
    pub const fn as_db_str(self) -> &'static str {
        match self {
            Self::Classroom => "classroom",
            Self::Hall => "hall",
            Self::Library => "library",
            Self::Lab => "lab",
            Self::Auditorium => "auditorium",
            Self::Other => "other",
        }
    }

    /// Parse a database string back into a category.
    ///
    /// Unknown strings map to [`SpaceType::Other`] rather than failing --
    /// the category is informational and must never block a decision.
    pub fn from_db_str(value: &str) -> Self {
        match value {
            "classroom" => Self::Classroom,
            "hall" => Self::Hall,
            "library" => Self::Library,
            "lab" => Self::Lab,
            "auditorium" => Self::Auditorium,
            _ => Self::Other,
        }
    }
}

// ---------------------------------------------------------------------------
// Decision outcomes
// ---------------------------------------------------------------------------

/// The terminal outcome of one evaluation of a scheduled event.
///
/// Every call to the decision engine ends in exactly one of these states
/// and appends exactly one audit record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    /// Predicted occupancy is within the safety threshold; nothing changes.
    Safe,
    /// The space is predicted to overload but no qualifying alternative
    /// exists; nothing changes.
    NoAction,
    /// The event was moved to an alternative space.
    Reassigned,
}

impl Decision {
    /// Database string representation of this outcome.
    pub const fn as_db_str(self) -> &'static str {
        match self {
            Self::Safe => "SAFE",
            Self::NoAction => "NO_ACTION",
            Self::Reassigned => "REASSIGNED",
        }
    }
}

impl core::fmt::Display for Decision {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_db_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn space_type_db_roundtrip() {
        for t in [
            SpaceType::Classroom,
            SpaceType::Hall,
            SpaceType::Library,
            SpaceType::Lab,
            SpaceType::Auditorium,
            SpaceType::Other,
        ] {
            assert_eq!(SpaceType::from_db_str(t.as_db_str()), t);
        }
    }

    #[test]
    fn unknown_space_type_maps_to_other() {
        assert_eq!(SpaceType::from_db_str("rooftop"), SpaceType::Other);
    }

    #[test]
    fn decision_display_matches_db_str() {
        assert_eq!(Decision::Safe.to_string(), "SAFE");
        assert_eq!(Decision::NoAction.to_string(), "NO_ACTION");
        assert_eq!(Decision::Reassigned.to_string(), "REASSIGNED");
    }
}

//! Read-model payloads returned to callers of the decision core.
//!
//! These types are never persisted as-is; they are assembled from the
//! entity structs for caller display and reporting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::Decision;
use crate::ids::SpaceId;
use crate::structs::Space;

/// The result of one `evaluate` call, for caller display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionOutcome {
    /// The terminal decision.
    pub decision: Decision,
    /// Human-readable explanation of the decision.
    pub reason: String,
    /// The space the event occupied when evaluation started.
    pub from_space: Space,
    /// The space the event occupies after the decision. Equals
    /// `from_space` unless the decision is [`Decision::Reassigned`].
    pub to_space: Space,
}

/// The result of recording feedback against the most recent prediction
/// for a space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccuracyReport {
    /// The space the feedback concerns.
    pub space_id: SpaceId,
    /// The predicted headcount being graded.
    pub predicted: u32,
    /// The reported actual headcount.
    pub actual: u32,
    /// Derived accuracy score in `[0, 1]`; 1.0 on an exact match.
    pub accuracy: f64,
}

/// A space joined with its most recent observation, for occupancy
/// listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceOccupancy {
    /// The space.
    pub space: Space,
    /// Latest observed headcount, if any observation exists.
    pub current_count: Option<u32>,
    /// When that observation was recorded.
    pub observed_at: Option<DateTime<Utc>>,
}

/// One row of the decision audit history, names resolved for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionHistoryEntry {
    /// Name of the evaluated event, if it still exists.
    pub event_name: Option<String>,
    /// Name of the space the event was assigned to before the decision.
    pub from_space: Option<String>,
    /// Name of the space the event was assigned to after the decision.
    pub to_space: Option<String>,
    /// The recorded explanation.
    pub reason: String,
    /// When the decision was made.
    pub decided_at: DateTime<Utc>,
}

/// Aggregated prediction accuracy for one space: mean absolute error over
/// all recorded samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpaceAccuracy {
    /// The space.
    pub space_id: SpaceId,
    /// The space's display name.
    pub space_name: String,
    /// Mean absolute error margin across samples.
    pub avg_error: f64,
    /// Number of samples behind the mean.
    pub sample_count: u64,
}

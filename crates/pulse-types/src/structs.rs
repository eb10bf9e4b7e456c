//! Core entity structs for the `PulseCampus` occupancy tracker.
//!
//! Covers the persisted entities: spaces, scheduled events, occupancy
//! observations, predictions, decision records, and accuracy samples.
//! Field names and types are the contract every storage adapter must
//! preserve.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{Decision, SpaceType};
use crate::ids::{DecisionId, EventId, ObservationId, PredictionId, SampleId, SpaceId};

// ---------------------------------------------------------------------------
// Space
// ---------------------------------------------------------------------------

/// A physical location with fixed capacity, tracked for occupancy.
///
/// Immutable after creation except by administrative operations outside
/// the decision core's scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Space {
    /// Unique identifier.
    pub id: SpaceId,
    /// Human-readable name ("Main Hall", "Lab B2").
    pub name: String,
    /// Category of the space.
    pub space_type: SpaceType,
    /// Safe capacity in headcount. Always positive.
    pub capacity: u32,
}

// ---------------------------------------------------------------------------
// OccupancyObservation
// ---------------------------------------------------------------------------

/// One observed headcount for a space at a point in time.
///
/// Append-only. The observed count may transiently exceed the space's
/// capacity -- sensors report what they see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccupancyObservation {
    /// Unique identifier.
    pub id: ObservationId,
    /// The observed space.
    pub space_id: SpaceId,
    /// Observed headcount.
    pub count: u32,
    /// When the observation was recorded.
    pub recorded_at: DateTime<Utc>,
}

impl OccupancyObservation {
    /// Create a new observation with a fresh identifier.
    pub fn new(space_id: SpaceId, count: u32, recorded_at: DateTime<Utc>) -> Self {
        Self {
            id: ObservationId::new(),
            space_id,
            count,
            recorded_at,
        }
    }
}

// ---------------------------------------------------------------------------
// ScheduledEvent
// ---------------------------------------------------------------------------

/// A scheduled activity bound to exactly one space at any instant.
///
/// The `space_id` field is the reassignment target: it changes only
/// through the decision engine's reassignment path or an explicit manual
/// reassignment, and every change produces exactly one audit record in
/// the same atomic unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledEvent {
    /// Unique identifier.
    pub id: EventId,
    /// Human-readable name.
    pub name: String,
    /// Priority or category label ("exam", "club", "lecture").
    pub priority: String,
    /// The currently assigned space.
    pub space_id: SpaceId,
    /// Scheduled start time.
    pub starts_at: DateTime<Utc>,
    /// Scheduled end time.
    pub ends_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Prediction
// ---------------------------------------------------------------------------

/// An occupancy prediction for a space at a target time.
///
/// Write-once: predictions are appended and later referenced by accuracy
/// samples, never updated. The predicted count is always clamped to
/// `[0, capacity]` by the predictor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Unique identifier.
    pub id: PredictionId,
    /// The space this prediction is for.
    pub space_id: SpaceId,
    /// Predicted headcount, clamped to the space's capacity.
    pub predicted_count: u32,
    /// The instant the prediction targets.
    pub target_time: DateTime<Utc>,
    /// Heuristic confidence score: 0.85 with four or more backing
    /// observations, 0.6 otherwise.
    pub confidence: f64,
    /// When the prediction was computed.
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// DecisionRecord
// ---------------------------------------------------------------------------

/// One immutable audit entry describing the outcome of one evaluation.
///
/// Append-only; never mutated or deleted. `to_space_id` equals
/// `from_space_id` when no move occurred.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionRecord {
    /// Unique identifier.
    pub id: DecisionId,
    /// The evaluated event. `None` for context-free evaluations.
    pub event_id: Option<EventId>,
    /// The space the event was assigned to when the decision was made.
    pub from_space_id: SpaceId,
    /// The space the event is assigned to after the decision.
    pub to_space_id: SpaceId,
    /// The terminal outcome of the evaluation.
    pub decision: Decision,
    /// Human-readable explanation of the decision.
    pub reason: String,
    /// When the decision was made.
    pub decided_at: DateTime<Utc>,
}

impl DecisionRecord {
    /// Build a record for a decision that leaves the event in place
    /// (SAFE or `NO_ACTION`).
    pub fn stay(event_id: EventId, space_id: SpaceId, decision: Decision, reason: String) -> Self {
        Self {
            id: DecisionId::new(),
            event_id: Some(event_id),
            from_space_id: space_id,
            to_space_id: space_id,
            decision,
            reason,
            decided_at: Utc::now(),
        }
    }

    /// Build a record for a reassignment from one space to another.
    pub fn moved(event_id: EventId, from: SpaceId, to: SpaceId, reason: String) -> Self {
        Self {
            id: DecisionId::new(),
            event_id: Some(event_id),
            from_space_id: from,
            to_space_id: to,
            decision: Decision::Reassigned,
            reason,
            decided_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// AccuracySample
// ---------------------------------------------------------------------------

/// One comparison of a past prediction against a later reported actual
/// count. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccuracySample {
    /// Unique identifier.
    pub id: SampleId,
    /// The space the feedback concerns.
    pub space_id: SpaceId,
    /// The prediction this sample grades.
    pub prediction_id: PredictionId,
    /// The reported actual headcount.
    pub actual_count: u32,
    /// Absolute difference between predicted and actual counts.
    pub error_margin: u32,
    /// When the feedback was recorded.
    pub recorded_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// TelemetryReading
// ---------------------------------------------------------------------------

/// A keyed telemetry value (crowd index, power draw, ...).
///
/// Telemetry is an explicit keyed map with last-write-wins upsert
/// semantics, keyed by `key`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryReading {
    /// Stable key identifying the metric.
    pub key: String,
    /// Current value, stored as text to accommodate mixed units.
    pub value: String,
    /// Unit label ("%", "kW").
    pub unit: String,
    /// Status label ("ok", "warn").
    pub status: String,
    /// Human-readable display label.
    pub label: String,
    /// When the value was last written.
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn stay_record_keeps_spaces_equal() {
        let event = EventId::new();
        let space = SpaceId::new();
        let record = DecisionRecord::stay(
            event,
            space,
            Decision::Safe,
            String::from("SAFE: predicted occupancy 40% within capacity"),
        );
        assert_eq!(record.from_space_id, record.to_space_id);
        assert_eq!(record.decision, Decision::Safe);
        assert_eq!(record.event_id, Some(event));
    }

    #[test]
    fn moved_record_tracks_both_spaces() {
        let from = SpaceId::new();
        let to = SpaceId::new();
        let record =
            DecisionRecord::moved(EventId::new(), from, to, String::from("overload"));
        assert_eq!(record.from_space_id, from);
        assert_eq!(record.to_space_id, to);
        assert_eq!(record.decision, Decision::Reassigned);
    }

    #[test]
    fn prediction_roundtrip_serde() {
        let prediction = Prediction {
            id: PredictionId::new(),
            space_id: SpaceId::new(),
            predicted_count: 42,
            target_time: Utc::now(),
            confidence: 0.85,
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&prediction).unwrap();
        let restored: Prediction = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, prediction);
    }
}

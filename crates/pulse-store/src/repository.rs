//! Repository trait contracts for the `PulseCampus` data layer.
//!
//! One trait per collaborator contract. The decision core is generic over
//! a type implementing [`Store`], so any backend that satisfies these
//! traits -- relational, file-backed, or an in-memory test double -- can
//! sit behind the engine unchanged. Field names and types of the entity
//! structs are part of the contract.

use chrono::Utc;
use pulse_types::{
    AccuracySample, DecisionHistoryEntry, DecisionRecord, EventId, OccupancyObservation,
    Prediction, ScheduledEvent, Space, SpaceAccuracy, SpaceId, SpaceOccupancy, TelemetryReading,
};

use crate::error::StoreError;

/// Capacity lookup and listing for tracked spaces.
pub trait SpaceRepository {
    /// Fetch a space by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no such space exists.
    async fn get_space(&self, id: SpaceId) -> Result<Space, StoreError>;

    /// List every tracked space.
    async fn list_spaces(&self) -> Result<Vec<Space>, StoreError>;

    /// List reassignment candidates: every space other than `exclude`
    /// whose capacity is at least `capacity_gte`, in ascending id order.
    ///
    /// The ascending id order is load-bearing: it is the deterministic
    /// tie-break input for the alternative-space selector.
    async fn list_candidates(
        &self,
        capacity_gte: u32,
        exclude: SpaceId,
    ) -> Result<Vec<Space>, StoreError>;

    /// Insert a new space.
    async fn insert_space(&self, space: &Space) -> Result<(), StoreError>;
}

/// Append-only time series of observed headcounts per space.
pub trait OccupancyLogRepository {
    /// The most recent `limit` observations for a space, newest first.
    async fn recent_observations(
        &self,
        space_id: SpaceId,
        limit: usize,
    ) -> Result<Vec<OccupancyObservation>, StoreError>;

    /// Append one observation.
    async fn append_observation(
        &self,
        observation: &OccupancyObservation,
    ) -> Result<(), StoreError>;

    /// Every space joined with its latest observation, for occupancy
    /// listings. Spaces with no observations yet appear with `None`.
    async fn latest_per_space(&self) -> Result<Vec<SpaceOccupancy>, StoreError>;
}

/// CRUD on scheduled events. The space assignment is the only mutable
/// field, and callers outside the decision engine must not touch it.
pub trait EventRepository {
    /// Fetch an event by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no such event exists.
    async fn get_event(&self, id: EventId) -> Result<ScheduledEvent, StoreError>;

    /// List every scheduled event.
    async fn list_events(&self) -> Result<Vec<ScheduledEvent>, StoreError>;

    /// Insert a new event.
    async fn insert_event(&self, event: &ScheduledEvent) -> Result<(), StoreError>;

    /// Point an event at a new space.
    ///
    /// Prefer [`ReassignmentUnit::commit_reassignment`], which pairs the
    /// update with its audit record atomically; this bare update exists
    /// for administrative tooling.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no such event exists.
    async fn update_event_space(
        &self,
        id: EventId,
        new_space_id: SpaceId,
    ) -> Result<(), StoreError>;
}

/// Append-only audit trail of decisions.
pub trait DecisionLogRepository {
    /// Append one decision record. Records are never mutated or deleted.
    async fn append_decision(&self, record: &DecisionRecord) -> Result<(), StoreError>;

    /// The full decision history, newest first, with event and space
    /// names resolved for display. Entities deleted since the decision
    /// resolve to `None`.
    async fn decision_history(&self) -> Result<Vec<DecisionHistoryEntry>, StoreError>;
}

/// Write-once predictions, later referenced by accuracy feedback.
pub trait PredictionRepository {
    /// Append one prediction.
    async fn append_prediction(&self, prediction: &Prediction) -> Result<(), StoreError>;

    /// The most recently created prediction for a space, if any.
    async fn most_recent_prediction(
        &self,
        space_id: SpaceId,
    ) -> Result<Option<Prediction>, StoreError>;
}

/// Append-only prediction-accuracy samples and their aggregation.
pub trait AccuracyRepository {
    /// Append one accuracy sample.
    async fn append_sample(&self, sample: &AccuracySample) -> Result<(), StoreError>;

    /// Mean absolute error margin and sample count, grouped by space.
    /// Samples whose space has been deleted are skipped.
    async fn per_space_accuracy(&self) -> Result<Vec<SpaceAccuracy>, StoreError>;
}

/// The atomic unit behind every reassignment: event update plus audit
/// record, both visible or neither.
pub trait ReassignmentUnit {
    /// Atomically point `event_id` at `to_space_id` and append `record`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the event or target space does
    /// not exist (nothing is written), or
    /// [`StoreError::TransactionFailure`] if the commit could not complete
    /// (any partial mutation is rolled back).
    async fn commit_reassignment(
        &self,
        event_id: EventId,
        to_space_id: SpaceId,
        record: &DecisionRecord,
    ) -> Result<(), StoreError>;
}

/// Keyed telemetry map with last-write-wins upsert semantics.
///
/// Replaces the upsert-by-scan pattern: readings are keyed by their
/// metric name and the newest write for a key always wins.
pub trait TelemetryRepository {
    /// Fetch the reading for `key`, or return `default` if the key has
    /// never been written. The default is not persisted.
    async fn get_or_default(
        &self,
        key: &str,
        default: TelemetryReading,
    ) -> Result<TelemetryReading, StoreError>;

    /// Insert or overwrite the reading for its key (last write wins).
    async fn upsert_telemetry(&self, reading: &TelemetryReading) -> Result<(), StoreError>;

    /// Every stored reading.
    async fn list_telemetry(&self) -> Result<Vec<TelemetryReading>, StoreError>;
}

/// Everything the decision engine needs from a backend.
///
/// Blanket-implemented for any type satisfying the component traits.
pub trait Store:
    SpaceRepository
    + OccupancyLogRepository
    + EventRepository
    + DecisionLogRepository
    + PredictionRepository
    + AccuracyRepository
    + ReassignmentUnit
    + Send
    + Sync
{
}

impl<T> Store for T where
    T: SpaceRepository
        + OccupancyLogRepository
        + EventRepository
        + DecisionLogRepository
        + PredictionRepository
        + AccuracyRepository
        + ReassignmentUnit
        + Send
        + Sync
{
}

/// Build a default telemetry reading for a key that has never been
/// written, stamped now.
pub fn default_reading(key: &str, label: &str, unit: &str) -> TelemetryReading {
    TelemetryReading {
        key: key.to_owned(),
        value: String::from("0"),
        unit: unit.to_owned(),
        status: String::from("ok"),
        label: label.to_owned(),
        updated_at: Utc::now(),
    }
}

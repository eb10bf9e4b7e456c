//! Shared type definitions for the `PulseCampus` occupancy tracker.
//!
//! This crate is the single source of truth for all types used across the
//! `PulseCampus` workspace: entity structs persisted by the data layer,
//! typed identifiers, and the report payloads returned by the decision
//! core.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for all entity identifiers
//! - [`enums`] -- Enumeration types (space categories, decision outcomes)
//! - [`structs`] -- Core entity structs (spaces, events, observations,
//!   predictions, audit records)
//! - [`reports`] -- Read-model payloads returned to callers

pub mod enums;
pub mod ids;
pub mod reports;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{Decision, SpaceType};
pub use ids::{DecisionId, EventId, ObservationId, PredictionId, SampleId, SpaceId};
pub use reports::{
    AccuracyReport, DecisionHistoryEntry, DecisionOutcome, SpaceAccuracy, SpaceOccupancy,
};
pub use structs::{
    AccuracySample, DecisionRecord, OccupancyObservation, Prediction, ScheduledEvent, Space,
    TelemetryReading,
};

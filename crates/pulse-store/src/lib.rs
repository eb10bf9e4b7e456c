//! Data layer for the `PulseCampus` occupancy tracker.
//!
//! Persistence is an interface, not a technology: the decision core talks
//! to the repository traits in [`repository`], and this crate provides two
//! backends satisfying identical contracts -- `PostgreSQL` for deployments
//! with a relational store, and a flat-file JSON store for single-node and
//! test use.
//!
//! # Architecture
//!
//! ```text
//! Decision core
//!     |
//!     +-- repository traits ----+--> PostgresStore (sqlx, migrations,
//!     |   (spaces, events,      |    transactional reassignment commit)
//!     |    occupancy, decisions,|
//!     |    predictions,         +--> JsonStore (one JSON file per table,
//!     |    accuracy, telemetry) |    whole-state RwLock)
//! ```
//!
//! # Modules
//!
//! - [`repository`] -- Trait contracts every backend must satisfy
//! - [`postgres`] -- `PostgreSQL` connection pool and backend
//! - [`jsonfile`] -- File-backed JSON backend
//! - [`error`] -- Shared error types

// Repository traits use native `async fn`; consumers are generic over a
// concrete backend, so the auto-trait caveats of `async fn` in public
// traits do not bite here.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod jsonfile;
pub mod postgres;
pub mod repository;

// Re-export primary types for convenience.
pub use error::StoreError;
pub use jsonfile::JsonStore;
pub use postgres::{PostgresConfig, PostgresStore};
pub use repository::{
    AccuracyRepository, DecisionLogRepository, EventRepository, OccupancyLogRepository,
    PredictionRepository, ReassignmentUnit, SpaceRepository, Store, TelemetryRepository,
    default_reading,
};

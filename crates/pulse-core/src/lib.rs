//! Occupancy prediction and the resource reassignment decision engine for
//! `PulseCampus`.
//!
//! This crate owns the decision pipeline that keeps scheduled events out
//! of overcrowded spaces: predict occupancy, detect a capacity conflict,
//! pick the least-utilized alternative, and commit the reassignment
//! together with its audit record.
//!
//! # Modules
//!
//! - [`predictor`] -- Rolling-average occupancy prediction with
//!   hour-of-day weighting.
//! - [`conflict`] -- The pure 85%-threshold conflict check.
//! - [`selector`] -- Least-utilized alternative-space selection.
//! - [`engine`] -- The [`DecisionEngine`] orchestrating
//!   predict -> detect -> select -> commit.
//! - [`feedback`] -- Prediction-accuracy feedback tracking.
//! - [`config`] -- Configuration loading from `pulse-config.yaml`.
//!
//! [`DecisionEngine`]: engine::DecisionEngine

pub mod config;
pub mod conflict;
pub mod engine;
pub mod error;
pub mod feedback;
pub mod predictor;
pub mod selector;

pub use engine::{DecisionEngine, SweepStats};
pub use error::CoreError;

//! Rolling-average occupancy prediction with hour-of-day weighting.
//!
//! The estimate is an explicit heuristic, not a learned model: the mean
//! of the last five observations for the space, scaled by a multiplier
//! derived from the target hour, clamped to the space's capacity. It is
//! deterministic for a fixed observation snapshot and performs no writes,
//! so concurrent predictions never block observation ingest.

use chrono::{DateTime, Duration, Timelike, Utc};
use pulse_types::{Prediction, PredictionId, SpaceId};
use pulse_store::{OccupancyLogRepository, PredictionRepository, SpaceRepository};

use crate::conflict::round_to_count;
use crate::error::CoreError;

/// How many recent observations feed the rolling average.
pub const OBSERVATION_WINDOW: usize = 5;

/// Fraction of capacity assumed when a space has no observations yet.
pub const COLD_START_FACTOR: f64 = 0.2;

/// Confidence reported with at least [`HIGH_CONFIDENCE_OBSERVATIONS`]
/// backing observations.
pub const CONFIDENCE_HIGH: f64 = 0.85;

/// Confidence reported with a thin observation history.
pub const CONFIDENCE_LOW: f64 = 0.6;

/// Observation count at which confidence switches to
/// [`CONFIDENCE_HIGH`].
pub const HIGH_CONFIDENCE_OBSERVATIONS: usize = 4;

/// Multiplier applied to the base estimate for the target hour (UTC).
///
/// Morning and evening peaks push the estimate up; overnight hours pull
/// it down.
pub const fn hour_multiplier(hour: u32) -> f64 {
    match hour {
        9..=11 => 1.2,
        18..=20 => 1.1,
        0..=6 | 23.. => 0.5,
        _ => 1.0,
    }
}

/// Predict occupancy for `space_id` at `target_time`.
///
/// Pure read: the returned [`Prediction`] is not persisted. Use
/// [`predict_and_store`] when feedback should later be able to reference
/// it.
///
/// # Errors
///
/// Returns [`CoreError::Store`] with a `NotFound` cause if the space does
/// not exist, or any repository read failure.
pub async fn predict<R>(
    store: &R,
    space_id: SpaceId,
    target_time: DateTime<Utc>,
) -> Result<Prediction, CoreError>
where
    R: SpaceRepository + OccupancyLogRepository,
{
    let space = store.get_space(space_id).await?;
    let observations = store
        .recent_observations(space_id, OBSERVATION_WINDOW)
        .await?;

    let base_estimate = if observations.is_empty() {
        f64::from(space.capacity) * COLD_START_FACTOR
    } else {
        let sum: f64 = observations.iter().map(|o| f64::from(o.count)).sum();
        sum / window_len(observations.len())
    };

    let multiplier = hour_multiplier(target_time.hour());
    let predicted_count = round_to_count(
        (base_estimate * multiplier)
            .round()
            .clamp(0.0, f64::from(space.capacity)),
    );

    let confidence = if observations.len() >= HIGH_CONFIDENCE_OBSERVATIONS {
        CONFIDENCE_HIGH
    } else {
        CONFIDENCE_LOW
    };

    tracing::debug!(
        space_id = %space_id,
        predicted_count,
        confidence,
        observations = observations.len(),
        multiplier,
        "Predicted occupancy"
    );

    Ok(Prediction {
        id: PredictionId::new(),
        space_id,
        predicted_count,
        target_time,
        confidence,
        created_at: Utc::now(),
    })
}

/// Predict occupancy and persist the prediction so later feedback can
/// reference it.
///
/// # Errors
///
/// Returns [`CoreError::Store`] on any repository failure.
pub async fn predict_and_store<R>(
    store: &R,
    space_id: SpaceId,
    target_time: DateTime<Utc>,
) -> Result<Prediction, CoreError>
where
    R: SpaceRepository + OccupancyLogRepository + PredictionRepository,
{
    let prediction = predict(store, space_id, target_time).await?;
    store.append_prediction(&prediction).await?;
    Ok(prediction)
}

/// Refresh the stored prediction for every space, targeting `horizon`
/// past now. Returns the number of predictions written.
///
/// # Errors
///
/// Returns [`CoreError::InvalidInput`] if the horizon overflows the
/// timeline, or [`CoreError::Store`] on any repository failure.
pub async fn refresh_all<R>(store: &R, horizon: Duration) -> Result<usize, CoreError>
where
    R: SpaceRepository + OccupancyLogRepository + PredictionRepository,
{
    let target_time =
        Utc::now()
            .checked_add_signed(horizon)
            .ok_or_else(|| CoreError::InvalidInput {
                message: String::from("prediction horizon overflows the timeline"),
            })?;

    let spaces = store.list_spaces().await?;
    let mut refreshed = 0_usize;
    for space in &spaces {
        let prediction = predict(store, space.id, target_time).await?;
        store.append_prediction(&prediction).await?;
        refreshed = refreshed.saturating_add(1);
    }

    tracing::info!(refreshed, "Refreshed predictions for all spaces");
    Ok(refreshed)
}

/// Observation window length as a float divisor (the window never
/// exceeds [`OBSERVATION_WINDOW`]).
fn window_len(len: usize) -> f64 {
    f64::from(u32::try_from(len).unwrap_or(u32::MAX))
}

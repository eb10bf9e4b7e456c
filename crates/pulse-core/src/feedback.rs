//! Accuracy feedback: grade past predictions against reported actuals.
//!
//! Feedback targets the most recent prediction for a space. Each call
//! appends one immutable [`AccuracySample`] and returns the derived
//! accuracy score; samples are later aggregated per space as mean
//! absolute error.

use chrono::Utc;
use pulse_store::{AccuracyRepository, PredictionRepository, StoreError};
use pulse_types::{AccuracyReport, AccuracySample, SampleId, SpaceAccuracy, SpaceId};

use crate::error::CoreError;

/// Record an observed actual count against the most recent prediction
/// for `space_id`.
///
/// The accuracy score is `1 - margin / max(actual, predicted)`, clamped
/// to `[0, 1]`. An actual count of zero scores 1.0 regardless of the
/// prediction, because the relative-error formula has no meaningful
/// denominator there.
///
/// # Errors
///
/// Returns [`CoreError::Store`] with a `NotFound` cause if the space has
/// no prediction on record.
pub async fn record_feedback<R>(
    store: &R,
    space_id: SpaceId,
    actual_count: u32,
) -> Result<AccuracyReport, CoreError>
where
    R: PredictionRepository + AccuracyRepository,
{
    let prediction = store
        .most_recent_prediction(space_id)
        .await?
        .ok_or_else(|| StoreError::not_found("prediction", space_id))?;

    let predicted = prediction.predicted_count;
    let error_margin = predicted.abs_diff(actual_count);
    let accuracy = accuracy_score(predicted, actual_count);

    let sample = AccuracySample {
        id: SampleId::new(),
        space_id,
        prediction_id: prediction.id,
        actual_count,
        error_margin,
        recorded_at: Utc::now(),
    };
    store.append_sample(&sample).await?;

    tracing::debug!(
        space_id = %space_id,
        predicted,
        actual = actual_count,
        accuracy,
        "Feedback recorded"
    );
    Ok(AccuracyReport {
        space_id,
        predicted,
        actual: actual_count,
        accuracy,
    })
}

/// Mean absolute error per space, across all recorded samples.
///
/// # Errors
///
/// Returns [`CoreError::Store`] if the aggregation query fails.
pub async fn accuracy_by_space<R>(store: &R) -> Result<Vec<SpaceAccuracy>, CoreError>
where
    R: AccuracyRepository,
{
    Ok(store.per_space_accuracy().await?)
}

fn accuracy_score(predicted: u32, actual: u32) -> f64 {
    if actual == 0 {
        return 1.0;
    }
    let margin = f64::from(predicted.abs_diff(actual));
    let denominator = f64::from(predicted.max(actual));
    (1.0 - margin / denominator).clamp(0.0, 1.0)
}

//! Least-utilized alternative-space selection.
//!
//! Given a space to avoid and the capacity the event needs, rank every
//! other qualifying space by predicted utilization and pick the lowest.
//! Candidate predictions are independent read-only calls, so they run
//! concurrently.

use chrono::{DateTime, Utc};
use futures::future::join_all;
use pulse_store::{OccupancyLogRepository, SpaceRepository};
use pulse_types::{Space, SpaceId};

use crate::conflict::utilization_fraction;
use crate::error::CoreError;
use crate::predictor;

/// Find the best alternative space: capacity at least
/// `required_capacity`, id different from `exclude`, minimum predicted
/// utilization at `target_time`.
///
/// Ties on utilization break to the lowest space id: candidates arrive
/// in ascending id order and only a strictly lower utilization displaces
/// the current best, so the result is deterministic for a fixed
/// observation snapshot.
///
/// Returns `None` when no space qualifies.
///
/// # Errors
///
/// Returns [`CoreError::Store`] if listing candidates or any candidate
/// prediction fails.
pub async fn find_alternative<R>(
    store: &R,
    exclude: SpaceId,
    required_capacity: u32,
    target_time: DateTime<Utc>,
) -> Result<Option<Space>, CoreError>
where
    R: SpaceRepository + OccupancyLogRepository,
{
    let candidates = store.list_candidates(required_capacity, exclude).await?;
    if candidates.is_empty() {
        return Ok(None);
    }

    let predictions = join_all(
        candidates
            .iter()
            .map(|candidate| predictor::predict(store, candidate.id, target_time)),
    )
    .await;

    let mut best: Option<(f64, &Space)> = None;
    for (candidate, prediction) in candidates.iter().zip(predictions) {
        let prediction = prediction?;
        let utilization = utilization_fraction(prediction.predicted_count, candidate.capacity);
        if best
            .as_ref()
            .is_none_or(|(lowest, _)| utilization < *lowest)
        {
            best = Some((utilization, candidate));
        }
    }

    let selected = best.map(|(_, candidate)| candidate.clone());
    if let Some(space) = &selected {
        tracing::debug!(
            exclude = %exclude,
            selected = %space.id,
            name = space.name,
            "Selected alternative space"
        );
    }
    Ok(selected)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use pulse_store::JsonStore;
    use pulse_types::{OccupancyObservation, SpaceType};
    use uuid::Uuid;

    use super::*;

    fn temp_store_dir(tag: &str) -> std::path::PathBuf {
        let unique = format!(
            "pulse_core_selector_{tag}_{}_{:?}",
            std::process::id(),
            std::thread::current().id(),
        );
        std::env::temp_dir().join(unique)
    }

    /// Deterministic low ids so tie-breaks are predictable in tests.
    fn space_with_id(ordinal: u128, name: &str, capacity: u32) -> Space {
        Space {
            id: SpaceId::from(Uuid::from_u128(ordinal)),
            name: name.to_owned(),
            space_type: SpaceType::Classroom,
            capacity,
        }
    }

    fn afternoon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 14, 0, 0).unwrap()
    }

    async fn seed_counts(store: &JsonStore, space_id: SpaceId, counts: &[u32]) {
        for &count in counts {
            store
                .append_observation(&OccupancyObservation::new(space_id, count, afternoon()))
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn picks_least_utilized_candidate() {
        let store = JsonStore::open(temp_store_dir("least")).await.unwrap();
        let origin = space_with_id(1, "Origin", 100);
        let busy = space_with_id(2, "Busy", 100);
        let quiet = space_with_id(3, "Quiet", 100);
        for s in [&origin, &busy, &quiet] {
            store.insert_space(s).await.unwrap();
        }
        seed_counts(&store, busy.id, &[80, 80, 80]).await;
        seed_counts(&store, quiet.id, &[5, 5, 5]).await;

        let selected = find_alternative(&store, origin.id, 100, afternoon())
            .await
            .unwrap();
        assert_eq!(selected.map(|s| s.id), Some(quiet.id));
    }

    #[tokio::test]
    async fn never_returns_excluded_or_undersized() {
        let store = JsonStore::open(temp_store_dir("filter")).await.unwrap();
        let origin = space_with_id(1, "Origin", 100);
        let small = space_with_id(2, "Small", 60);
        for s in [&origin, &small] {
            store.insert_space(s).await.unwrap();
        }

        let selected = find_alternative(&store, origin.id, 100, afternoon())
            .await
            .unwrap();
        assert!(selected.is_none());
    }

    #[tokio::test]
    async fn tie_breaks_to_lowest_id() {
        let store = JsonStore::open(temp_store_dir("tie")).await.unwrap();
        let origin = space_with_id(9, "Origin", 100);
        // Identical capacity and no observations: identical cold-start
        // utilization for both candidates.
        let second = space_with_id(5, "Second", 120);
        let first = space_with_id(3, "First", 120);
        for s in [&origin, &second, &first] {
            store.insert_space(s).await.unwrap();
        }

        let selected = find_alternative(&store, origin.id, 100, afternoon())
            .await
            .unwrap();
        assert_eq!(selected.map(|s| s.id), Some(first.id));
    }

    #[tokio::test]
    async fn empty_candidate_set_returns_none() {
        let store = JsonStore::open(temp_store_dir("empty")).await.unwrap();
        let origin = space_with_id(1, "Origin", 100);
        store.insert_space(&origin).await.unwrap();

        let selected = find_alternative(&store, origin.id, 50, afternoon())
            .await
            .unwrap();
        assert!(selected.is_none());
    }
}

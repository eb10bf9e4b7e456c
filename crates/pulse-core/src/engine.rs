//! The decision engine: predict -> detect -> select -> commit.
//!
//! [`DecisionEngine::evaluate`] is the entry point for one scheduled
//! event. Every call reaches exactly one terminal outcome (SAFE,
//! `NO_ACTION`, or REASSIGNED) and appends exactly one decision record;
//! a reassignment commits the event mutation and its audit record as one
//! atomic unit through the backend's [`ReassignmentUnit`].
//!
//! Concurrent calls for the *same* event are serialized with a per-event
//! async lock held across the whole read-modify-write, so two racing
//! evaluations can never both read the old space and silently overwrite
//! each other. Different events proceed in parallel. The engine holds no
//! other state between calls; each evaluation decides from current
//! repository state, so repeated calls may legitimately keep reassigning
//! as observations change.
//!
//! [`ReassignmentUnit`]: pulse_store::ReassignmentUnit

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use pulse_store::Store;
use pulse_types::{Decision, DecisionOutcome, DecisionRecord, EventId, SpaceId};
use tokio::sync::Mutex as AsyncMutex;

use crate::conflict::{is_conflict, utilization_pct};
use crate::error::CoreError;
use crate::predictor;
use crate::selector;

/// Orchestrates the decision pipeline over a storage backend.
pub struct DecisionEngine<R> {
    store: Arc<R>,
    // Grows by one entry per distinct event ever evaluated; entries are
    // a pointer-sized mutex each, which is negligible at campus scale.
    event_locks: StdMutex<HashMap<EventId, Arc<AsyncMutex<()>>>>,
}

/// Counts from one full-evaluation sweep across all events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    /// Events that reached a terminal decision.
    pub evaluated: usize,
    /// Events whose space was predicted safe.
    pub safe: usize,
    /// Conflicted events with no qualifying alternative.
    pub no_action: usize,
    /// Events moved to an alternative space.
    pub reassigned: usize,
    /// Events whose evaluation failed (logged, sweep continued).
    pub failed: usize,
}

impl<R: Store> DecisionEngine<R> {
    /// Create an engine over a storage backend.
    pub fn new(store: Arc<R>) -> Self {
        Self {
            store,
            event_locks: StdMutex::new(HashMap::new()),
        }
    }

    /// The backend this engine operates over.
    pub fn store(&self) -> &R {
        &self.store
    }

    /// The per-event lock, created on first use. The registry mutex is
    /// held only to clone the entry, never across an await.
    fn lock_for(&self, event_id: EventId) -> Arc<AsyncMutex<()>> {
        let mut locks = self
            .event_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(event_id).or_default())
    }

    /// Evaluate one event and commit the resulting decision.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Store`] with a `NotFound` cause if the event
    /// or its space is missing, or a `TransactionFailure` cause if the
    /// reassignment commit could not complete (in which case neither the
    /// event mutation nor the audit record is visible).
    pub async fn evaluate(&self, event_id: EventId) -> Result<DecisionOutcome, CoreError> {
        let lock = self.lock_for(event_id);
        let _guard = lock.lock().await;
        self.evaluate_locked(event_id).await
    }

    async fn evaluate_locked(&self, event_id: EventId) -> Result<DecisionOutcome, CoreError> {
        let store = self.store.as_ref();
        let event = store.get_event(event_id).await?;
        let space = store.get_space(event.space_id).await?;

        let prediction = predictor::predict(store, space.id, event.starts_at).await?;
        let pct = utilization_pct(prediction.predicted_count, space.capacity);

        if !is_conflict(prediction.predicted_count, space.capacity) {
            let record = DecisionRecord::stay(
                event.id,
                space.id,
                Decision::Safe,
                format!("SAFE: predicted occupancy {pct}% within capacity"),
            );
            store.append_decision(&record).await?;

            tracing::info!(
                event_id = %event.id,
                space = space.name,
                utilization_pct = pct,
                "Evaluation: SAFE"
            );
            return Ok(DecisionOutcome {
                decision: Decision::Safe,
                reason: format!(
                    "Predicted occupancy is {pct}%, which is within safe capacity limits."
                ),
                from_space: space.clone(),
                to_space: space,
            });
        }

        let alternative =
            selector::find_alternative(store, space.id, space.capacity, event.starts_at).await?;

        let Some(alternative) = alternative else {
            let record = DecisionRecord::stay(
                event.id,
                space.id,
                Decision::NoAction,
                String::from("NO_ACTION: no suitable alternative space available"),
            );
            store.append_decision(&record).await?;

            tracing::warn!(
                event_id = %event.id,
                space = space.name,
                utilization_pct = pct,
                "Evaluation: NO_ACTION (overloaded, no alternative)"
            );
            return Ok(DecisionOutcome {
                decision: Decision::NoAction,
                reason: String::from(
                    "No suitable alternative space available without disrupting higher priority events.",
                ),
                from_space: space.clone(),
                to_space: space,
            });
        };

        let alt_prediction =
            predictor::predict(store, alternative.id, event.starts_at).await?;
        let alt_pct = utilization_pct(alt_prediction.predicted_count, alternative.capacity);

        let record = DecisionRecord::moved(
            event.id,
            space.id,
            alternative.id,
            format!("REASSIGNED: predicted overload {pct}%, alternative at {alt_pct}%"),
        );
        store
            .commit_reassignment(event.id, alternative.id, &record)
            .await?;

        tracing::info!(
            event_id = %event.id,
            from = space.name,
            to = alternative.name,
            utilization_pct = pct,
            alternative_pct = alt_pct,
            "Evaluation: REASSIGNED"
        );
        Ok(DecisionOutcome {
            decision: Decision::Reassigned,
            reason: format!(
                "{} is predicted to exceed safe capacity ({pct}%). {} is underutilized ({alt_pct}%) and can safely accommodate the event.",
                space.name, alternative.name
            ),
            from_space: space,
            to_space: alternative,
        })
    }

    /// Unconditionally move an event to `to_space_id`, bypassing
    /// prediction and conflict logic. Human override: the caller's
    /// reason goes into the audit record verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidInput`] for an empty reason (no
    /// repository access is attempted), or [`CoreError::Store`] if the
    /// event or target space is missing or the atomic commit fails.
    pub async fn manual_reassign(
        &self,
        event_id: EventId,
        to_space_id: SpaceId,
        reason: &str,
    ) -> Result<DecisionRecord, CoreError> {
        if reason.trim().is_empty() {
            return Err(CoreError::InvalidInput {
                message: String::from("a manual reassignment requires a reason"),
            });
        }

        let lock = self.lock_for(event_id);
        let _guard = lock.lock().await;

        let store = self.store.as_ref();
        let event = store.get_event(event_id).await?;
        let target = store.get_space(to_space_id).await?;

        let record =
            DecisionRecord::moved(event.id, event.space_id, target.id, reason.to_owned());
        store
            .commit_reassignment(event.id, target.id, &record)
            .await?;

        tracing::info!(
            event_id = %event.id,
            to = target.name,
            "Manual reassignment committed"
        );
        Ok(record)
    }

    /// Evaluate every scheduled event, continuing past per-event
    /// failures.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Store`] only if the event listing itself
    /// fails; individual evaluation failures are logged and counted.
    pub async fn evaluate_all(&self) -> Result<SweepStats, CoreError> {
        let events = self.store.list_events().await?;
        let mut stats = SweepStats::default();

        for event in &events {
            match self.evaluate(event.id).await {
                Ok(outcome) => {
                    stats.evaluated = stats.evaluated.saturating_add(1);
                    match outcome.decision {
                        Decision::Safe => stats.safe = stats.safe.saturating_add(1),
                        Decision::NoAction => {
                            stats.no_action = stats.no_action.saturating_add(1);
                        }
                        Decision::Reassigned => {
                            stats.reassigned = stats.reassigned.saturating_add(1);
                        }
                    }
                }
                Err(error) => {
                    stats.failed = stats.failed.saturating_add(1);
                    tracing::error!(event_id = %event.id, error = %error, "Evaluation failed");
                }
            }
        }

        Ok(stats)
    }
}

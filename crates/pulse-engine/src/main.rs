//! Decision daemon entry point for the `PulseCampus` occupancy tracker.
//!
//! Wires configuration, the storage backend, and the decision engine into
//! a periodic sweep loop: refresh predictions for every space, then
//! evaluate every scheduled event, until Ctrl-C.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `pulse-config.yaml` (or `PULSE_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Open the configured storage backend (`PostgreSQL` or flat-file
//!    JSON), running migrations where applicable
//! 4. Run the sweep loop until shutdown

mod error;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use pulse_core::config::{BackendKind, PulseConfig};
use pulse_core::{DecisionEngine, predictor};
use pulse_store::{JsonStore, PostgresStore, Store};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::DaemonError;

/// Application entry point for the decision daemon.
///
/// # Errors
///
/// Returns an error if any initialization step or the sweep loop fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let config_path = std::env::var("PULSE_CONFIG")
        .map_or_else(|_| PathBuf::from("pulse-config.yaml"), PathBuf::from);
    let config = PulseConfig::load_or_default(&config_path)?;

    // 2. Initialize structured logging. `RUST_LOG` wins over the
    //    configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!(config_path = %config_path.display(), "pulse-engine starting");
    info!(
        horizon_minutes = config.predictor.horizon_minutes,
        sweep_interval_secs = config.sweep.interval_secs,
        "Configuration loaded"
    );

    // 3. Open the configured storage backend.
    match config.infrastructure.backend {
        BackendKind::Postgres => {
            info!("Opening PostgreSQL backend");
            let store = PostgresStore::connect_url(&config.infrastructure.postgres_url).await?;
            store.run_migrations().await?;
            info!("PostgreSQL connected, migrations applied");
            run_sweeps(Arc::new(store), &config).await?;
        }
        BackendKind::Json => {
            info!(
                data_dir = %config.infrastructure.data_dir.display(),
                "Opening flat-file JSON backend"
            );
            let store = JsonStore::open(&config.infrastructure.data_dir).await?;
            run_sweeps(Arc::new(store), &config).await?;
        }
    }

    info!("pulse-engine stopped");
    Ok(())
}

/// The sweep loop: every interval, refresh predictions for all spaces
/// and evaluate all scheduled events. Runs until Ctrl-C.
async fn run_sweeps<R: Store>(store: Arc<R>, config: &PulseConfig) -> Result<(), DaemonError> {
    let engine = DecisionEngine::new(Arc::clone(&store));
    let horizon = chrono::Duration::minutes(
        i64::try_from(config.predictor.horizon_minutes).unwrap_or(i64::MAX),
    );
    let mut interval = tokio::time::interval(Duration::from_secs(config.sweep.interval_secs));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    info!("Entering sweep loop");
    loop {
        tokio::select! {
            _ = interval.tick() => {
                // Per-event failures are counted inside the sweep; an
                // error here means the backend itself is unusable.
                let refreshed = predictor::refresh_all(store.as_ref(), horizon).await?;
                info!(refreshed, "Prediction refresh complete");

                let stats = engine.evaluate_all().await?;
                info!(
                    evaluated = stats.evaluated,
                    safe = stats.safe,
                    no_action = stats.no_action,
                    reassigned = stats.reassigned,
                    failed = stats.failed,
                    "Sweep complete"
                );
            }
            result = tokio::signal::ctrl_c() => {
                result.map_err(DaemonError::from)?;
                info!("Shutdown signal received, exiting sweep loop");
                return Ok(());
            }
        }
    }
}

//! Periodic library rescans.
//!
//! The worker rescans the library root on a fixed interval and folds each
//! report into the shared snapshot. A failed rescan is logged and the
//! previous snapshot keeps being served; the next tick tries again.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::api::ApiState;

/// Default interval between rescans: 12 hours.
pub const DEFAULT_RESCAN_INTERVAL: Duration = Duration::from_secs(12 * 60 * 60);

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Time between rescans. Zero disables periodic rescans.
    pub rescan_interval: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            rescan_interval: DEFAULT_RESCAN_INTERVAL,
        }
    }
}

/// Rescans the library on a timer.
pub struct RescanWorker {
    state: Arc<ApiState>,
    config: WorkerConfig,
}

impl RescanWorker {
    pub fn new(state: Arc<ApiState>, config: WorkerConfig) -> Self {
        Self { state, config }
    }

    /// Run until the task is aborted.
    ///
    /// The first rescan happens one full interval after start; the startup
    /// scan is the caller's job.
    pub async fn run(self) {
        info!(
            interval_secs = self.config.rescan_interval.as_secs(),
            "Rescan worker started"
        );

        let mut ticker = tokio::time::interval(self.config.rescan_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            self.rescan().await;
        }
    }

    async fn rescan(&self) {
        match self.state.refresh().await {
            Ok(report) => {
                debug!(
                    scanned = report.entries.len(),
                    created_publications = report.created_publications,
                    created_installments = report.created_installments,
                    "Periodic rescan finished"
                );
                if report.created_publications > 0 {
                    info!(
                        created = report.created_publications,
                        "New publications found"
                    );
                }
            }
            Err(e) => {
                error!(error = %e, "Periodic rescan failed, keeping previous snapshot");
            }
        }
    }
}

/// Spawn the rescan worker, unless periodic rescans are disabled.
pub fn spawn_worker(
    state: Arc<ApiState>,
    config: WorkerConfig,
) -> Option<tokio::task::JoinHandle<()>> {
    if config.rescan_interval.is_zero() {
        info!("Periodic rescans disabled");
        return None;
    }

    let worker = RescanWorker::new(state, config);
    Some(tokio::spawn(worker.run()))
}

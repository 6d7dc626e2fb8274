//! Background sync loop
//!
//! Drives event cycles at a fixed cadence and, for sources with snapshot
//! support, interleaves facility reconciliation at its own slower interval.
//! Cycle errors are logged and the loop keeps going; only a shutdown signal
//! stops it.

use crate::core::sync::engine::SyncEngine;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, warn};

pub struct SyncOrchestrator {
    engine: Arc<SyncEngine>,
    interval: Duration,
    objects_interval: Duration,
    shutdown: watch::Receiver<bool>,
}

impl SyncOrchestrator {
    pub fn new(
        engine: Arc<SyncEngine>,
        interval_seconds: u64,
        objects_interval_seconds: u64,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            engine,
            interval: Duration::from_secs(interval_seconds),
            objects_interval: Duration::from_secs(objects_interval_seconds),
            shutdown,
        }
    }

    /// Run the loop until shutdown is signalled
    pub async fn run(mut self) {
        info!(
            interval_secs = self.interval.as_secs(),
            objects_interval_secs = self.objects_interval.as_secs(),
            "Sync loop started"
        );

        // First objects pass runs on the first tick.
        let mut last_objects_sync: Option<Instant> = None;

        loop {
            if *self.shutdown.borrow() {
                break;
            }
            let started = Instant::now();

            match self.engine.sync_events().await {
                Ok(report) => {
                    debug!(status = %report.status, processed = report.processed, "Event cycle")
                }
                Err(error) => warn!(%error, "Event sync cycle failed"),
            }

            if self.engine.supports_reconciliation() {
                let due = last_objects_sync
                    .is_none_or(|at| at.elapsed() >= self.objects_interval);
                if due {
                    match self.engine.sync_objects().await {
                        Ok(report) => debug!(
                            status = %report.status,
                            objects = report.objects,
                            failed = report.failed,
                            "Object cycle"
                        ),
                        Err(error) => warn!(%error, "Object sync cycle failed"),
                    }
                    last_objects_sync = Some(Instant::now());
                }
            }

            // A slow cycle still yields at least a short pause before the
            // next one.
            let sleep_for = self
                .interval
                .saturating_sub(started.elapsed())
                .max(Duration::from_secs(1));

            tokio::select! {
                _ = tokio::time::sleep(sleep_for) => {}
                _ = self.shutdown.changed() => {
                    if *self.shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Sync loop stopped");
    }
}

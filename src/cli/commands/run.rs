//! Run command implementation
//!
//! This module implements the `run` command: the long-lived background sync
//! loop with graceful shutdown.

use crate::adapters::agency::create_event_source;
use crate::adapters::store::create_store;
use crate::config::load_config;
use crate::core::sync::{SyncEngine, SyncOrchestrator};
use clap::Args;
use std::sync::Arc;
use tokio::sync::watch;

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Run one event cycle immediately before entering the loop cadence
    #[arg(long)]
    pub sync_on_start: bool,
}

impl RunArgs {
    /// Execute the run command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Starting sync service");

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Failed to load configuration: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        if !config.sync.enabled {
            println!("Sync loop is disabled in configuration (sync.enabled = false)");
            return Ok(0);
        }

        let store = match create_store(&config) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Failed to create canonical store: {e}");
                return Ok(4); // Connection error exit code
            }
        };
        if let Err(e) = store.test_connection().await {
            eprintln!("Canonical store connection failed: {e}");
            return Ok(4);
        }
        store.ensure_schema().await?;

        let source = create_event_source(&config.agency)?;
        if source.is_none() {
            tracing::warn!("No agency url configured; sync cycles will be skipped");
        }

        let engine = Arc::new(SyncEngine::new(source, store, &config));

        if self.sync_on_start {
            match engine.sync_events().await {
                Ok(report) => {
                    tracing::info!(status = %report.status, processed = report.processed, "Initial sync cycle done")
                }
                Err(e) => tracing::warn!(error = %e, "Initial sync cycle failed"),
            }
        }

        let orchestrator = SyncOrchestrator::new(
            engine,
            config.sync.interval_seconds,
            config.sync.objects_interval_seconds,
            shutdown_signal,
        );
        orchestrator.run().await;

        println!("Sync service stopped");
        Ok(0)
    }
}

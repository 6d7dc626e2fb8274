//! Manual sync command implementations
//!
//! One-shot `sync-events` and `sync-objects` runs. Each trigger goes
//! through the job registry, so the invocation is tracked the same way a
//! polling caller would see it, and the final job snapshot is printed as
//! JSON.

use crate::adapters::agency::create_event_source;
use crate::adapters::store::create_store;
use crate::config::{load_config, SvodConfig};
use crate::core::sync::{JobRegistry, JobStatus, SyncEngine, SyncJob};
use clap::Args;
use std::sync::Arc;
use std::time::Duration;

/// Arguments for the sync-events command
#[derive(Args, Debug)]
pub struct SyncEventsArgs {
    /// Override the per-cycle row limit
    #[arg(long)]
    pub limit: Option<u32>,
}

impl SyncEventsArgs {
    /// Execute the sync-events command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let mut config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Failed to load configuration: {e}");
                return Ok(2);
            }
        };
        if let Some(limit) = self.limit {
            tracing::info!(limit, "Overriding events limit from CLI");
            config.sync.events_limit = limit;
        }

        run_job(&config, "events", |engine| async move {
            let report = engine.sync_events().await?;
            Ok(serde_json::to_value(report)?)
        })
        .await
    }
}

/// Arguments for the sync-objects command
#[derive(Args, Debug)]
pub struct SyncObjectsArgs {}

impl SyncObjectsArgs {
    /// Execute the sync-objects command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Failed to load configuration: {e}");
                return Ok(2);
            }
        };

        run_job(&config, "objects", |engine| async move {
            let report = engine.sync_objects().await?;
            Ok(serde_json::to_value(report)?)
        })
        .await
    }
}

/// Run one manual sync cycle through the job registry and print the final
/// job snapshot
async fn run_job<F, Fut>(config: &SvodConfig, job_type: &str, work: F) -> anyhow::Result<i32>
where
    F: FnOnce(Arc<SyncEngine>) -> Fut,
    Fut: std::future::Future<Output = crate::domain::Result<serde_json::Value>> + Send + 'static,
{
    let store = match create_store(config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to create canonical store: {e}");
            return Ok(4);
        }
    };
    if let Err(e) = store.test_connection().await {
        eprintln!("Canonical store connection failed: {e}");
        return Ok(4);
    }
    store.ensure_schema().await?;

    let source = create_event_source(&config.agency)?;
    let engine = Arc::new(SyncEngine::new(source, store, config));

    let registry = JobRegistry::new();
    let job = registry.create(job_type).await;
    registry.start(&job.id, work(engine)).await;

    let job = wait_for_job(&registry, &job.id).await?;
    println!("{}", serde_json::to_string_pretty(&job)?);

    match job.status {
        JobStatus::Error => Ok(5),
        _ => Ok(0),
    }
}

async fn wait_for_job(registry: &JobRegistry, job_id: &str) -> anyhow::Result<SyncJob> {
    loop {
        match registry.get(job_id).await {
            Some(job) if job.status == JobStatus::Done || job.status == JobStatus::Error => {
                return Ok(job)
            }
            Some(_) => tokio::time::sleep(Duration::from_millis(50)).await,
            None => anyhow::bail!("job {job_id} vanished from the registry"),
        }
    }
}

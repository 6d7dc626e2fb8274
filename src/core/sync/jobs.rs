//! Manual sync job tracking
//!
//! In-memory registry for manually triggered sync runs, so a caller can
//! start a run and poll its status instead of blocking. Nothing here is
//! persisted; a restart loses in-flight job status, and the sync itself
//! resumes from the durable cursor.

use crate::domain::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Done,
    Error,
}

/// Snapshot of one manually triggered sync run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncJob {
    pub id: String,
    #[serde(rename = "type")]
    pub job_type: String,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Process-lifetime registry of manual sync jobs
#[derive(Clone, Default)]
pub struct JobRegistry {
    jobs: Arc<Mutex<HashMap<String, SyncJob>>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new queued job and return its snapshot
    pub async fn create(&self, job_type: &str) -> SyncJob {
        let job = SyncJob {
            id: format!("{job_type}:{}", Uuid::new_v4()),
            job_type: job_type.to_string(),
            status: JobStatus::Queued,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
            result: None,
            error: None,
        };
        self.jobs
            .lock()
            .await
            .insert(job.id.clone(), job.clone());
        job
    }

    /// Mark the job running and execute `work` on a background task
    ///
    /// The job transitions to done with the work's JSON result, or to error
    /// with the failure message.
    pub async fn start<F>(&self, job_id: &str, work: F)
    where
        F: Future<Output = Result<serde_json::Value>> + Send + 'static,
    {
        {
            let mut jobs = self.jobs.lock().await;
            if let Some(job) = jobs.get_mut(job_id) {
                job.status = JobStatus::Running;
                job.started_at = Some(Utc::now());
            }
        }

        let jobs = self.jobs.clone();
        let job_id = job_id.to_string();
        tokio::spawn(async move {
            let outcome = work.await;
            let mut jobs = jobs.lock().await;
            if let Some(job) = jobs.get_mut(&job_id) {
                job.finished_at = Some(Utc::now());
                match outcome {
                    Ok(result) => {
                        job.status = JobStatus::Done;
                        job.result = Some(result);
                    }
                    Err(error) => {
                        job.status = JobStatus::Error;
                        job.error = Some(error.to_string());
                    }
                }
            }
        });
    }

    /// Current snapshot of a job, if it exists
    pub async fn get(&self, job_id: &str) -> Option<SyncJob> {
        self.jobs.lock().await.get(job_id).cloned()
    }
}

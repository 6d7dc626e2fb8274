//! Sync engine, background loop, and job tracking

pub mod engine;
pub mod jobs;
pub mod orchestrator;
pub mod report;

pub use engine::SyncEngine;
pub use jobs::{JobRegistry, JobStatus, SyncJob};
pub use orchestrator::SyncOrchestrator;
pub use report::{EventsSyncReport, ObjectsSyncReport};

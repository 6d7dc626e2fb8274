//! Sync cycle reports
//!
//! Serializable outcome summaries returned by the engine and surfaced by
//! the CLI as JSON.

use serde::{Deserialize, Serialize};

pub const STATUS_OK: &str = "ok";
pub const STATUS_SKIPPED: &str = "skipped";

/// Outcome of one event sync cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventsSyncReport {
    pub status: String,
    pub processed: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl EventsSyncReport {
    pub fn ok(processed: u64, cursor: String) -> Self {
        Self {
            status: STATUS_OK.to_string(),
            processed,
            cursor: Some(cursor),
            reason: None,
        }
    }

    pub fn skipped(reason: &str) -> Self {
        Self {
            status: STATUS_SKIPPED.to_string(),
            processed: 0,
            cursor: None,
            reason: Some(reason.to_string()),
        }
    }
}

/// Outcome of one object reconciliation cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectsSyncReport {
    pub status: String,
    pub objects: u64,
    pub failed: u64,
    pub source_objects: usize,
    pub source_groups: usize,
    pub source_responsibles: usize,
    pub source_phones: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ObjectsSyncReport {
    pub fn skipped(reason: &str) -> Self {
        Self {
            status: STATUS_SKIPPED.to_string(),
            objects: 0,
            failed: 0,
            source_objects: 0,
            source_groups: 0,
            source_responsibles: 0,
            source_phones: 0,
            reason: Some(reason.to_string()),
        }
    }
}

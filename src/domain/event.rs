//! Canonical event model
//!
//! The normalized event record written to the canonical store and read by
//! the dashboard. Field names serialize in camelCase regardless of which
//! upstream family produced the row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Event severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl Severity {
    /// Stable string form used for storage columns
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }

    /// Parse the storage string form
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "info" => Some(Severity::Info),
            "warning" => Some(Severity::Warning),
            "critical" => Some(Severity::Critical),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Active,
    Pending,
    Resolved,
}

impl EventStatus {
    /// Stable string form used for storage columns
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Active => "active",
            EventStatus::Pending => "pending",
            EventStatus::Resolved => "resolved",
        }
    }

    /// Parse the storage string form
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(EventStatus::Active),
            "pending" => Some(EventStatus::Pending),
            "resolved" => Some(EventStatus::Resolved),
            _ => None,
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical event record
///
/// `id` is globally unique and namespaced per source: a decimal alarm id for
/// the ledger family, `mssql:<dateKey>:<eventId>` for the partitioned archive
/// family. Re-delivery of the same upstream row always maps to the same `id`;
/// the upsert writer relies on this for idempotency.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalEvent {
    /// Immutable, source-namespaced identifier
    pub id: String,

    /// Instant the event occurred upstream
    pub timestamp: DateTime<Utc>,

    /// Event category (currently always "alarm")
    #[serde(rename = "type")]
    pub event_type: String,

    /// Upstream panel identifier, when the source carries one
    pub object_id: Option<String>,

    /// Display name of the facility object
    pub object_name: Option<String>,

    /// Client/contract holder display name
    pub client_name: Option<String>,

    pub severity: Severity,

    pub status: EventStatus,

    /// Assembled free-text description (labeled non-blank fields, one per line)
    pub description: String,

    /// Facility address, when known
    pub location: Option<String>,

    /// Operator/person associated with the event
    pub operator_id: Option<String>,
}

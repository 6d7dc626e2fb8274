//! Upstream source capability trait
//!
//! One trait covers both upstream families; the engine never branches on a
//! scheme string. A source knows its cursor key and codec, fetches rows
//! after a cursor, and optionally provides full facility snapshots for
//! reconciliation.

use crate::adapters::agency::rows::UpstreamRow;
use crate::domain::{ObjectSnapshot, Result, SourceCursor, SourceError};
use async_trait::async_trait;

/// Upstream source family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFamily {
    /// Single incrementing-id alarms table (MySQL)
    Ledger,
    /// Monthly-partitioned archive table pairs (MSSQL)
    Archive,
}

impl SourceFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceFamily::Ledger => "ledger",
            SourceFamily::Archive => "archive",
        }
    }
}

/// Capability interface over an upstream agency source
#[async_trait]
pub trait EventSource: Send + Sync {
    /// The source family this implementation serves
    fn family(&self) -> SourceFamily;

    /// Cursor-store key under which this source's watermark is persisted
    fn cursor_key(&self) -> &'static str;

    /// Cursor used when no watermark is persisted yet
    fn default_cursor(&self) -> SourceCursor;

    /// Decode a persisted cursor value with this source's codec
    fn parse_cursor(&self, raw: &str) -> Result<SourceCursor>;

    /// Fetch up to `limit` rows strictly after `cursor`, in the source's
    /// natural ascending order
    async fn fetch_since(&self, cursor: SourceCursor, limit: u32) -> Result<Vec<UpstreamRow>>;

    /// Whether this source can produce full facility snapshots
    fn supports_reconciliation(&self) -> bool {
        false
    }

    /// Fetch the full facility metadata snapshot
    async fn fetch_objects_snapshot(&self) -> Result<ObjectSnapshot> {
        Err(SourceError::Unsupported(format!(
            "{} source does not provide object snapshots",
            self.family().as_str()
        ))
        .into())
    }
}

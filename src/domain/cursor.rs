//! Sync cursors (watermarks)
//!
//! A cursor records the last successfully processed position in an upstream
//! source's natural ordering. The ledger source orders by a single
//! incrementing alarm id; the partitioned archive source orders by
//! `(Date_Key, Event_id)`. Encodings follow the wire contract: a decimal
//! integer string for the ledger, `"<dateKey>:<eventId>"` for the archive,
//! with the date key in `YYYYMMDD` form.

use crate::domain::{Result, SvodError};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::fmt;

/// Cursor-store key for the ledger source watermark
pub const LEDGER_CURSOR_KEY: &str = "agency_mysql.last_alarm_id";

/// Cursor-store key for the partitioned archive source watermark
pub const ARCHIVE_CURSOR_KEY: &str = "agency_mssql.archive.cursor";

/// Position in an upstream source's ordering
///
/// Tagged per source family; positions from different families are not
/// comparable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceCursor {
    /// Last processed alarm id in the ledger source
    Ledger(i64),
    /// Last processed `(Date_Key, Event_id)` pair in the archive source
    Archive { date_key: u32, event_id: i64 },
}

impl SourceCursor {
    /// Encode into the persisted string form
    pub fn encode(&self) -> String {
        match self {
            SourceCursor::Ledger(id) => id.to_string(),
            SourceCursor::Archive { date_key, event_id } => format!("{date_key}:{event_id}"),
        }
    }

    /// Parse a ledger cursor (decimal integer string)
    pub fn parse_ledger(raw: &str) -> Result<Self> {
        let id: i64 = raw
            .trim()
            .parse()
            .map_err(|_| SvodError::Store(format!("invalid ledger cursor value: {raw:?}")))?;
        Ok(SourceCursor::Ledger(id))
    }

    /// Parse an archive cursor (`"<dateKey>:<eventId>"`; a bare date key is
    /// accepted with the event id defaulting to 0)
    pub fn parse_archive(raw: &str) -> Result<Self> {
        let mut parts = raw.trim().splitn(2, ':');
        let date_key: u32 = parts
            .next()
            .unwrap_or("")
            .parse()
            .map_err(|_| SvodError::Store(format!("invalid archive cursor value: {raw:?}")))?;
        let event_id: i64 = match parts.next() {
            Some(s) => s
                .parse()
                .map_err(|_| SvodError::Store(format!("invalid archive cursor value: {raw:?}")))?,
            None => 0,
        };
        Ok(SourceCursor::Archive { date_key, event_id })
    }
}

impl fmt::Display for SourceCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl PartialOrd for SourceCursor {
    /// Ordering within one source family; `None` across families.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (SourceCursor::Ledger(a), SourceCursor::Ledger(b)) => a.partial_cmp(b),
            (
                SourceCursor::Archive {
                    date_key: d1,
                    event_id: e1,
                },
                SourceCursor::Archive {
                    date_key: d2,
                    event_id: e2,
                },
            ) => Some((d1, e1).cmp(&(d2, e2))),
            _ => None,
        }
    }
}

/// Persisted watermark row, one per upstream source
#[derive(Debug, Clone)]
pub struct SyncCursorRecord {
    pub key: String,
    pub value: String,
    pub updated_at: DateTime<Utc>,
}

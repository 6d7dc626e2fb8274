//! Raw upstream row shapes
//!
//! Rows as fetched from the agency databases, before normalization. Both
//! families keep their timestamp optional: the fetchers retain rows whose
//! date/time fields cannot be combined into a concrete instant, and the
//! mapper decides to drop them. The cursor still advances past such rows.

use crate::domain::SourceCursor;
use chrono::NaiveDateTime;

/// One alarm row from the MySQL ledger, joined with its facility row
#[derive(Debug, Clone, Default)]
pub struct LedgerAlarmRow {
    /// ID_ALARMS, the single incrementing primary id
    pub id: i64,
    /// ID_OBJECTS foreign key, when set
    pub object_id: Option<i64>,
    /// DATE_ALARM + TIME_ALARM combined
    pub timestamp: Option<NaiveDateTime>,

    // Status/severity indicator flags
    pub is_loss: bool,
    pub is_penalty: bool,
    pub is_done: bool,
    pub is_request: bool,

    // Labeled description fields, in output order
    pub inspection: Option<String>,
    pub inspection_result: Option<String>,
    pub notes: Option<String>,
    pub request_result: Option<String>,
    pub loop_number: Option<String>,
    pub penalty_number: Option<String>,
    pub response_car: Option<String>,
    pub engineer_name: Option<String>,
    pub operator_name: Option<String>,

    // Display fields from the joined facility row
    pub object_number: Option<String>,
    pub object_address: Option<String>,
    pub contact_name: Option<String>,
}

/// One event row from a monthly MSSQL archive partition, enriched with the
/// latest companion eventservice row when one exists
#[derive(Debug, Clone, Default)]
pub struct ArchiveEventRow {
    /// Date_Key in YYYYMMDD form
    pub date_key: u32,
    /// Event_id, unique within a date key
    pub event_id: i64,
    /// TimeEvent
    pub timestamp: Option<NaiveDateTime>,
    pub panel_id: Option<String>,
    pub code: Option<String>,
    pub zone: Option<String>,
    pub line: Option<String>,
    pub result_text: Option<String>,

    // From the latest eventservice row, absent when no companion row exists
    pub state_name: Option<String>,
    pub person: Option<String>,
    pub responder_group: Option<String>,
}

/// A fetched upstream row, tagged by source family
#[derive(Debug, Clone)]
pub enum UpstreamRow {
    Ledger(LedgerAlarmRow),
    Archive(ArchiveEventRow),
}

impl UpstreamRow {
    /// The row's position in its source's natural ordering
    pub fn position(&self) -> SourceCursor {
        match self {
            UpstreamRow::Ledger(row) => SourceCursor::Ledger(row.id),
            UpstreamRow::Archive(row) => SourceCursor::Archive {
                date_key: row.date_key,
                event_id: row.event_id,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_tracks_family() {
        let ledger = UpstreamRow::Ledger(LedgerAlarmRow {
            id: 42,
            ..Default::default()
        });
        assert_eq!(ledger.position(), SourceCursor::Ledger(42));

        let archive = UpstreamRow::Archive(ArchiveEventRow {
            date_key: 20260115,
            event_id: 7,
            ..Default::default()
        });
        assert_eq!(
            archive.position(),
            SourceCursor::Archive {
                date_key: 20260115,
                event_id: 7
            }
        );
    }
}

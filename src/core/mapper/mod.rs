//! Event mapper
//!
//! Pure translation from raw upstream rows to [`CanonicalEvent`]. Each
//! family carries its own derivation rules; both share the "only non-blank
//! fields, labeled, newline-joined" description convention. A row without a
//! usable timestamp is a mapping error: the caller drops it and continues
//! the batch.

use crate::adapters::agency::rows::{ArchiveEventRow, LedgerAlarmRow, UpstreamRow};
use crate::domain::{CanonicalEvent, EventStatus, Result, Severity, SvodError};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

const EVENT_TYPE_ALARM: &str = "alarm";
const UNKNOWN_CLIENT: &str = "Не указан";

/// Map one upstream row to a canonical event
///
/// # Errors
///
/// Returns a mapping error when the row's timestamp is absent.
pub fn map_row(row: &UpstreamRow) -> Result<CanonicalEvent> {
    match row {
        UpstreamRow::Ledger(row) => map_ledger_row(row),
        UpstreamRow::Archive(row) => map_archive_row(row),
    }
}

fn map_ledger_row(row: &LedgerAlarmRow) -> Result<CanonicalEvent> {
    let timestamp = require_timestamp(row.timestamp, &row.id.to_string())?;

    let severity = if row.is_loss {
        Severity::Critical
    } else if row.is_penalty {
        Severity::Warning
    } else {
        Severity::Info
    };

    let status = if row.is_done {
        EventStatus::Resolved
    } else if row.is_request {
        EventStatus::Pending
    } else {
        EventStatus::Active
    };

    let description = join_labeled(&[
        ("Осмотр", row.inspection.as_deref()),
        ("Результат", row.inspection_result.as_deref()),
        ("Заметки", row.notes.as_deref()),
        ("Заявка", row.request_result.as_deref()),
        ("Шлейф", row.loop_number.as_deref()),
        ("Штраф", row.penalty_number.as_deref()),
        ("ГБР", row.response_car.as_deref()),
        ("Инженер", row.engineer_name.as_deref()),
        ("Оператор", row.operator_name.as_deref()),
    ]);

    let object_name = match non_blank(row.object_number.as_deref()) {
        Some(num) => format!("Объект {num}"),
        None => match row.object_id {
            Some(id) => format!("Объект {id}"),
            None => "Объект".to_string(),
        },
    };

    Ok(CanonicalEvent {
        id: row.id.to_string(),
        timestamp,
        event_type: EVENT_TYPE_ALARM.to_string(),
        object_id: None,
        object_name: Some(object_name),
        client_name: Some(
            non_blank(row.contact_name.as_deref()).unwrap_or_else(|| UNKNOWN_CLIENT.to_string()),
        ),
        severity,
        status,
        description,
        location: non_blank(row.object_address.as_deref()),
        operator_id: non_blank(row.operator_name.as_deref()),
    })
}

fn map_archive_row(row: &ArchiveEventRow) -> Result<CanonicalEvent> {
    let id = format!("mssql:{}:{}", row.date_key, row.event_id);
    let timestamp = require_timestamp(row.timestamp, &id)?;

    let state_name = non_blank(row.state_name.as_deref());
    let status = if state_name.is_some() {
        EventStatus::Resolved
    } else {
        EventStatus::Active
    };

    let mut description = join_labeled(&[
        ("Code", row.code.as_deref()),
        ("Zone", row.zone.as_deref()),
        ("Line", row.line.as_deref()),
        ("State", row.state_name.as_deref()),
        ("Person", row.person.as_deref()),
        ("GBR", row.responder_group.as_deref()),
    ]);
    if let Some(result_text) = non_blank(row.result_text.as_deref()) {
        if !description.is_empty() {
            description.push('\n');
        }
        description.push_str(&result_text);
    }

    let panel_id = non_blank(row.panel_id.as_deref());

    Ok(CanonicalEvent {
        id,
        timestamp,
        event_type: EVENT_TYPE_ALARM.to_string(),
        object_name: Some(
            panel_id
                .clone()
                .unwrap_or_else(|| "Объект".to_string()),
        ),
        object_id: panel_id,
        client_name: None,
        // The archive stream does not encode upstream severity.
        severity: Severity::Info,
        status,
        description,
        location: None,
        operator_id: non_blank(row.person.as_deref()),
    })
}

fn require_timestamp(ts: Option<NaiveDateTime>, id: &str) -> Result<DateTime<Utc>> {
    match ts {
        Some(naive) => Ok(Utc.from_utc_datetime(&naive)),
        None => Err(SvodError::Mapping(format!(
            "row {id} has no usable timestamp"
        ))),
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn join_labeled(fields: &[(&str, Option<&str>)]) -> String {
    fields
        .iter()
        .filter_map(|(label, value)| non_blank(*value).map(|v| format!("{label}: {v}")))
        .collect::<Vec<_>>()
        .join("\n")
}

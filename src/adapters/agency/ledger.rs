//! Ledger source (MySQL alarms schema)
//!
//! Pulls alarm rows strictly after a watermark id, joined with the facility
//! table for display fields, in one bounded query. The split
//! `DATE_ALARM`/`TIME_ALARM` pair is combined into a single optional
//! timestamp; rows that cannot be combined are retained with no timestamp
//! and the mapper drops them.

use crate::adapters::agency::address::MySqlAddress;
use crate::adapters::agency::rows::{LedgerAlarmRow, UpstreamRow};
use crate::adapters::agency::traits::{EventSource, SourceFamily};
use crate::domain::{Result, SourceCursor, SourceError, SvodError, LEDGER_CURSOR_KEY};
use async_trait::async_trait;
use chrono::{NaiveDateTime, NaiveTime};
use mysql_async::prelude::*;
use mysql_async::{Conn, Opts, OptsBuilder, Row};
use tracing::debug;

/// Numeric-ish fields are cast to CHAR so row decoding is uniform across
/// schema variants.
const FETCH_SQL: &str = r"
SELECT
  a.ID_ALARMS,
  a.ID_OBJECTS,
  CAST(a.NUMBER_CAR AS CHAR) AS NUMBER_CAR,
  a.FIO_OPERATORS,
  a.FIO_ENGINEERS,
  CAST(a.NUMBER_SHLEIF AS CHAR) AS NUMBER_SHLEIF,
  a.OSMOTR,
  a.DATE_ALARM,
  a.TIME_ALARM,
  a.RESULT_OSMOTR,
  a.ZAMETKI,
  a.IS_ZAYAVKA,
  a.IS_DONE,
  a.RESULT_ZAYAVKA,
  a.IS_SHTRAF,
  CAST(a.NUM_SHTRAF AS CHAR) AS NUM_SHTRAF,
  a.IS_PROPAZHA,
  CAST(o.OBJ_NUMBER AS CHAR) AS OBJ_NUMBER,
  o.OBJ_ADRESS,
  o.OBJ_FIO
FROM alarms a
LEFT JOIN objects o ON o.ID_OBJECTS = a.ID_OBJECTS
WHERE a.ID_ALARMS > ?
ORDER BY a.ID_ALARMS ASC
LIMIT ?";

/// Ledger-style upstream source over `mysql_async`
pub struct LedgerSource {
    opts: Opts,
}

impl LedgerSource {
    pub fn new(address: &MySqlAddress) -> Self {
        let builder = OptsBuilder::default()
            .ip_or_hostname(address.host.clone())
            .tcp_port(address.port)
            .user(Some(address.username.clone()))
            .pass(address.password.clone())
            .db_name(Some(address.database.clone()))
            .init(vec![format!("SET NAMES {}", address.charset)]);
        Self {
            opts: Opts::from(builder),
        }
    }
}

#[async_trait]
impl EventSource for LedgerSource {
    fn family(&self) -> SourceFamily {
        SourceFamily::Ledger
    }

    fn cursor_key(&self) -> &'static str {
        LEDGER_CURSOR_KEY
    }

    fn default_cursor(&self) -> SourceCursor {
        SourceCursor::Ledger(0)
    }

    fn parse_cursor(&self, raw: &str) -> Result<SourceCursor> {
        SourceCursor::parse_ledger(raw)
    }

    async fn fetch_since(&self, cursor: SourceCursor, limit: u32) -> Result<Vec<UpstreamRow>> {
        let last_id = match cursor {
            SourceCursor::Ledger(id) => id,
            other => {
                return Err(SvodError::Other(format!(
                    "ledger source received a non-ledger cursor: {other}"
                )))
            }
        };

        let mut conn = Conn::new(self.opts.clone())
            .await
            .map_err(|e| SourceError::ConnectionFailed(e.to_string()))?;

        let rows: Vec<Row> = conn
            .exec(FETCH_SQL, (last_id, i64::from(limit)))
            .await
            .map_err(|e| SourceError::QueryFailed(e.to_string()))?;

        debug!(rows = rows.len(), last_id, "fetched ledger alarm rows");

        let mut out = Vec::with_capacity(rows.len());
        for mut row in rows {
            // A row without a usable primary id cannot be positioned; skip it.
            let id: i64 = match take(&mut row, "ID_ALARMS") {
                Some(id) => id,
                None => continue,
            };

            let date: Option<NaiveDateTime> = take(&mut row, "DATE_ALARM");
            let time: Option<NaiveTime> = take(&mut row, "TIME_ALARM");

            out.push(UpstreamRow::Ledger(LedgerAlarmRow {
                id,
                object_id: take(&mut row, "ID_OBJECTS"),
                timestamp: combine_timestamp(date, time),
                is_loss: take_flag(&mut row, "IS_PROPAZHA"),
                is_penalty: take_flag(&mut row, "IS_SHTRAF"),
                is_done: take_flag(&mut row, "IS_DONE"),
                is_request: take_flag(&mut row, "IS_ZAYAVKA"),
                inspection: take(&mut row, "OSMOTR"),
                inspection_result: take(&mut row, "RESULT_OSMOTR"),
                notes: take(&mut row, "ZAMETKI"),
                request_result: take(&mut row, "RESULT_ZAYAVKA"),
                loop_number: take(&mut row, "NUMBER_SHLEIF"),
                penalty_number: take(&mut row, "NUM_SHTRAF"),
                response_car: take(&mut row, "NUMBER_CAR"),
                engineer_name: take(&mut row, "FIO_ENGINEERS"),
                operator_name: take(&mut row, "FIO_OPERATORS"),
                object_number: take(&mut row, "OBJ_NUMBER"),
                object_address: take(&mut row, "OBJ_ADRESS"),
                contact_name: take(&mut row, "OBJ_FIO"),
            }));
        }

        conn.disconnect()
            .await
            .map_err(|e| SourceError::ConnectionFailed(e.to_string()))?;

        Ok(out)
    }
}

/// Takes a column value, treating NULL and unconvertible values alike
fn take<T: FromValue>(row: &mut Row, col: &str) -> Option<T> {
    match row.take_opt::<T, _>(col) {
        Some(Ok(v)) => Some(v),
        _ => None,
    }
}

fn take_flag(row: &mut Row, col: &str) -> bool {
    take::<i64>(row, col).map(|v| v != 0).unwrap_or(false)
}

fn combine_timestamp(
    date: Option<NaiveDateTime>,
    time: Option<NaiveTime>,
) -> Option<NaiveDateTime> {
    match (date, time) {
        (Some(d), Some(t)) => Some(NaiveDateTime::new(d.date(), t)),
        (Some(d), None) => Some(d),
        (None, _) => None,
    }
}

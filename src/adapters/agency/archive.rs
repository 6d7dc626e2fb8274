//! Partitioned archive source (MSSQL)
//!
//! Event history lives in one table-pair per calendar month,
//! `<archivesDatabase>.dbo.archive<YYYYMM>01` and
//! `<archivesDatabase>.dbo.eventservice<YYYYMM>01`. Fetching walks the
//! partitions in order from the cursor's month through the current month,
//! bounded by the batch limit. A partition whose table has not been created
//! upstream yet contributes zero rows and is not an error.
//!
//! This source also provides the full facility snapshot consumed by the
//! object reconciler.

use crate::adapters::agency::address::MsSqlAddress;
use crate::adapters::agency::rows::{ArchiveEventRow, UpstreamRow};
use crate::adapters::agency::traits::{EventSource, SourceFamily};
use crate::domain::{
    ObjectSnapshot, Result, SnapshotGroup, SnapshotObject, SnapshotPhone, SnapshotResponsible,
    SourceCursor, SourceError, SvodError, ARCHIVE_CURSOR_KEY,
};
use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use tiberius::{AuthMethod, Client, Config, EncryptionLevel, Row};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tracing::debug;

/// MSSQL "invalid object name" — raised when a monthly partition table has
/// not been created upstream yet
const MSSQL_INVALID_OBJECT_NAME: u32 = 208;

/// Partitioned-archive upstream source over tiberius
pub struct ArchiveSource {
    address: MsSqlAddress,
    archives_database: String,
    start_date_key: Option<u32>,
}

impl ArchiveSource {
    pub fn new(
        address: MsSqlAddress,
        archives_database: String,
        start_date_key: Option<u32>,
    ) -> Result<Self> {
        // The archives database name is interpolated into table identifiers.
        if archives_database.is_empty()
            || !archives_database
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(SvodError::Configuration(format!(
                "Invalid archives database name: {archives_database:?}"
            )));
        }
        Ok(Self {
            address,
            archives_database,
            start_date_key,
        })
    }

    async fn connect(&self) -> Result<Client<Compat<TcpStream>>> {
        let mut config = Config::new();
        config.host(&self.address.host);
        config.port(self.address.port);
        config.database(&self.address.database);
        config.authentication(AuthMethod::sql_server(
            self.address.username.clone(),
            self.address.password.clone().unwrap_or_default(),
        ));
        config.encryption(if self.address.encrypt {
            EncryptionLevel::Required
        } else {
            EncryptionLevel::Off
        });
        if self.address.trust_server_certificate {
            config.trust_cert();
        }

        let tcp = TcpStream::connect((self.address.host.as_str(), self.address.port))
            .await
            .map_err(|e| SourceError::ConnectionFailed(e.to_string()))?;
        tcp.set_nodelay(true)
            .map_err(|e| SourceError::ConnectionFailed(e.to_string()))?;

        Client::connect(config, tcp.compat_write())
            .await
            .map_err(|e| SourceError::ConnectionFailed(e.to_string()).into())
    }

    fn partition_query(&self, partition: u32, remaining: u32) -> String {
        let db = &self.archives_database;
        let archive_table = format!("{db}.dbo.archive{partition}01");
        let service_table = format!("{db}.dbo.eventservice{partition}01");
        format!(
            r"SELECT TOP ({remaining})
  CAST(a.Event_id AS BIGINT) AS Event_id,
  CAST(a.Date_Key AS INT) AS Date_Key,
  CAST(a.Panel_id AS NVARCHAR(64)) AS Panel_id,
  CAST(a.Line AS NVARCHAR(64)) AS Line,
  CAST(a.Zone AS NVARCHAR(64)) AS Zone,
  CAST(a.Code AS NVARCHAR(64)) AS Code,
  a.TimeEvent,
  CAST(a.Result_Text AS NVARCHAR(MAX)) AS Result_Text,
  es.NameState,
  es.PersonName,
  es.GrResponseName
FROM {archive_table} a
OUTER APPLY (
  SELECT TOP (1) s.NameState, s.PersonName, s.GrResponseName
  FROM {service_table} s
  WHERE s.Event_id = a.Event_id AND s.Date_Key = a.Date_Key
  ORDER BY s.OperationTime DESC
) es
WHERE a.Date_Key BETWEEN @P1 AND @P2
  AND (a.Date_Key > @P3 OR (a.Date_Key = @P4 AND a.Event_id > @P5))
ORDER BY a.Date_Key ASC, a.Event_id ASC"
        )
    }
}

#[async_trait]
impl EventSource for ArchiveSource {
    fn family(&self) -> SourceFamily {
        SourceFamily::Archive
    }

    fn cursor_key(&self) -> &'static str {
        ARCHIVE_CURSOR_KEY
    }

    fn default_cursor(&self) -> SourceCursor {
        let date_key = self.start_date_key.unwrap_or_else(current_month_start_key);
        SourceCursor::Archive {
            date_key,
            event_id: 0,
        }
    }

    fn parse_cursor(&self, raw: &str) -> Result<SourceCursor> {
        SourceCursor::parse_archive(raw)
    }

    async fn fetch_since(&self, cursor: SourceCursor, limit: u32) -> Result<Vec<UpstreamRow>> {
        let (cur_date_key, cur_event_id) = match cursor {
            SourceCursor::Archive { date_key, event_id } => (date_key, event_id),
            other => {
                return Err(SvodError::Other(format!(
                    "archive source received a non-archive cursor: {other}"
                )))
            }
        };

        if limit == 0 {
            return Ok(Vec::new());
        }

        let until_date_key = today_date_key();
        let mut client = self.connect().await?;
        let mut out: Vec<UpstreamRow> = Vec::new();

        for partition in enumerate_partitions(cur_date_key, until_date_key) {
            if out.len() as u32 >= limit {
                break;
            }
            let remaining = limit - out.len() as u32;
            let sql = self.partition_query(partition, remaining);

            let result = match client
                .query(
                    &sql,
                    &[
                        &(cur_date_key as i32),
                        &(until_date_key as i32),
                        &(cur_date_key as i32),
                        &(cur_date_key as i32),
                        &cur_event_id,
                    ],
                )
                .await
            {
                Ok(stream) => stream.into_first_result().await,
                Err(e) => Err(e),
            };

            let rows = match result {
                Ok(rows) => rows,
                Err(ref e) if is_missing_partition(e) => {
                    debug!(partition, "archive partition table missing, skipping");
                    continue;
                }
                Err(e) => return Err(SourceError::QueryFailed(e.to_string()).into()),
            };

            for row in rows {
                let (date_key, event_id) = match (
                    get_i32(&row, "Date_Key"),
                    get_i64(&row, "Event_id"),
                ) {
                    (Some(dk), Some(id)) if dk >= 0 => (dk as u32, id),
                    _ => continue,
                };

                out.push(UpstreamRow::Archive(ArchiveEventRow {
                    date_key,
                    event_id,
                    timestamp: get_datetime(&row, "TimeEvent"),
                    panel_id: get_string(&row, "Panel_id"),
                    code: get_string(&row, "Code"),
                    zone: get_string(&row, "Zone"),
                    line: get_string(&row, "Line"),
                    result_text: get_string(&row, "Result_Text"),
                    state_name: get_string(&row, "NameState"),
                    person: get_string(&row, "PersonName"),
                    responder_group: get_string(&row, "GrResponseName"),
                }));
            }
        }

        debug!(
            rows = out.len(),
            cursor = %SourceCursor::Archive { date_key: cur_date_key, event_id: cur_event_id },
            "fetched archive event rows"
        );
        Ok(out)
    }

    fn supports_reconciliation(&self) -> bool {
        true
    }

    async fn fetch_objects_snapshot(&self) -> Result<ObjectSnapshot> {
        let mut client = self.connect().await?;

        let object_rows = run_simple(
            &mut client,
            r"SELECT
  CAST(p.Panel_id AS NVARCHAR(64)) AS Panel_id,
  p.Disabled,
  p.Remarks,
  p.AdditionalTechnicalInformation,
  CAST(p.Latitude AS NVARCHAR(64)) AS Latitude,
  CAST(p.Longtitude AS NVARCHAR(64)) AS Longtitude,
  p.CreateDate,
  c.CompanyName,
  c.[address] AS CompanyAddress,
  c.Memo AS CompanyMemo
FROM dbo.Panel p
LEFT JOIN (
  SELECT Panel_id, MAX(CompanyID) AS CompanyID
  FROM dbo.Groups
  GROUP BY Panel_id
) g ON g.Panel_id = p.Panel_id
LEFT JOIN dbo.Company c ON c.ID = g.CompanyID",
        )
        .await?;

        let group_rows = run_simple(
            &mut client,
            r"SELECT
  CAST(Panel_id AS NVARCHAR(64)) AS Panel_id,
  CAST(Group_ AS INT) AS GroupNo,
  Message AS GroupName,
  IsOpen,
  TimeEvent
FROM dbo.Groups",
        )
        .await?;

        let responsible_rows = run_simple(
            &mut client,
            r"SELECT
  CAST(r.panel_id AS NVARCHAR(64)) AS Panel_id,
  CAST(r.Group_ AS INT) AS GroupNo,
  CAST(r.Responsible_Number AS INT) AS OrderNo,
  CAST(rl.ResponsiblesList_id AS BIGINT) AS ListId,
  rl.Responsible_Name AS ResponsibleName,
  rl.Responsible_Address AS ResponsibleAddress
FROM dbo.Responsibles r
INNER JOIN dbo.ResponsiblesList rl
  ON rl.ResponsiblesList_id = r.ResponsiblesList_id",
        )
        .await?;

        let phone_rows = run_simple(
            &mut client,
            r"SELECT
  CAST(ResponsiblesList_id AS BIGINT) AS ListId,
  PhoneNo,
  CAST(TypeTel_id AS INT) AS TypeId
FROM dbo.ResponsibleTel",
        )
        .await?;

        let mut snapshot = ObjectSnapshot::default();

        for row in &object_rows {
            let panel_id = match get_string(row, "Panel_id") {
                Some(id) => id,
                None => continue,
            };
            snapshot.objects.push(SnapshotObject {
                panel_id,
                company_name: get_string(row, "CompanyName"),
                company_address: get_string(row, "CompanyAddress"),
                company_memo: get_string(row, "CompanyMemo"),
                disabled: get_bool(row, "Disabled").unwrap_or(false),
                remarks: get_string(row, "Remarks"),
                additional_info: get_string(row, "AdditionalTechnicalInformation"),
                latitude: get_string(row, "Latitude"),
                longitude: get_string(row, "Longtitude"),
                created_at: get_datetime(row, "CreateDate"),
            });
        }

        for row in &group_rows {
            let (panel_id, group_no) = match (get_string(row, "Panel_id"), get_i32(row, "GroupNo"))
            {
                (Some(id), Some(no)) => (id, no),
                _ => continue,
            };
            snapshot.groups.push(SnapshotGroup {
                panel_id,
                group_no,
                name: get_string(row, "GroupName").unwrap_or_default(),
                is_open: get_bool(row, "IsOpen"),
                time_event: get_datetime(row, "TimeEvent"),
            });
        }

        for row in &responsible_rows {
            let panel_id = match get_string(row, "Panel_id") {
                Some(id) => id,
                None => continue,
            };
            snapshot.responsibles.push(SnapshotResponsible {
                panel_id,
                group_no: get_i32(row, "GroupNo"),
                order_no: get_i32(row, "OrderNo"),
                list_id: get_i64(row, "ListId"),
                name: get_string(row, "ResponsibleName").unwrap_or_default(),
                address: get_string(row, "ResponsibleAddress"),
            });
        }

        for row in &phone_rows {
            let (list_id, phone) = match (get_i64(row, "ListId"), get_string(row, "PhoneNo")) {
                (Some(id), Some(phone)) => (id, phone),
                _ => continue,
            };
            snapshot.phones.push(SnapshotPhone {
                list_id,
                phone,
                type_id: get_i32(row, "TypeId"),
            });
        }

        debug!(
            objects = snapshot.objects.len(),
            groups = snapshot.groups.len(),
            responsibles = snapshot.responsibles.len(),
            phones = snapshot.phones.len(),
            "fetched facility snapshot"
        );
        Ok(snapshot)
    }
}

/// Enumerates YYYYMM partition keys from the cursor's month through the
/// `until` month inclusive, with explicit December to January rollover
pub fn enumerate_partitions(from_date_key: u32, until_date_key: u32) -> Vec<u32> {
    let mut year = from_date_key / 10_000;
    let mut month = from_date_key / 100 % 100;
    let end_year = until_date_key / 10_000;
    let end_month = until_date_key / 100 % 100;

    let mut out = Vec::new();
    if !(1..=12).contains(&month) || !(1..=12).contains(&end_month) {
        return out;
    }
    while (year, month) <= (end_year, end_month) {
        out.push(year * 100 + month);
        if month == 12 {
            year += 1;
            month = 1;
        } else {
            month += 1;
        }
    }
    out
}

/// A partition table that has not been created upstream yet surfaces as
/// server error 208 (invalid object name); any other failure aborts the fetch
fn is_missing_partition(e: &tiberius::error::Error) -> bool {
    matches!(e, tiberius::error::Error::Server(token) if token.code() == MSSQL_INVALID_OBJECT_NAME)
}

fn today_date_key() -> u32 {
    Utc::now()
        .format("%Y%m%d")
        .to_string()
        .parse()
        .unwrap_or(0)
}

fn current_month_start_key() -> u32 {
    Utc::now()
        .format("%Y%m01")
        .to_string()
        .parse()
        .unwrap_or(0)
}

async fn run_simple(client: &mut Client<Compat<TcpStream>>, sql: &str) -> Result<Vec<Row>> {
    client
        .simple_query(sql)
        .await
        .map_err(|e| SourceError::QueryFailed(e.to_string()))?
        .into_first_result()
        .await
        .map_err(|e| SourceError::QueryFailed(e.to_string()).into())
}

fn get_string(row: &Row, col: &str) -> Option<String> {
    row.try_get::<&str, _>(col)
        .ok()
        .flatten()
        .map(|s| s.to_string())
}

fn get_i32(row: &Row, col: &str) -> Option<i32> {
    row.try_get::<i32, _>(col).ok().flatten()
}

fn get_i64(row: &Row, col: &str) -> Option<i64> {
    row.try_get::<i64, _>(col).ok().flatten()
}

fn get_bool(row: &Row, col: &str) -> Option<bool> {
    row.try_get::<bool, _>(col).ok().flatten()
}

fn get_datetime(row: &Row, col: &str) -> Option<NaiveDateTime> {
    row.try_get::<NaiveDateTime, _>(col).ok().flatten()
}

//! SQLite canonical store
//!
//! The embedded backend. SQLite supports `INSERT OR IGNORE` but bounds a
//! single statement to roughly 999 bind variables, so the writer chunks
//! bulk inserts ([`UpsertCapability::ChunkedConflictSkip`]). The connection
//! is serialized behind an async mutex; all statements within one
//! `replace_object` call run inside one transaction.

use crate::adapters::store::traits::{CanonicalStore, UpsertCapability};
use crate::domain::{
    CanonicalEvent, FacilityObject, ObjectGroup, Responsible, ResponsiblePhone, Result,
    SvodError, SyncCursorRecord,
};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, params_from_iter, Connection};
use std::collections::HashSet;
use std::path::Path;
use tokio::sync::Mutex;

const EVENT_COLUMN_COUNT: usize = 11;

/// SQLite's default bind-variable ceiling is 999; 80 rows of 11 columns
/// stays safely below it.
const MAX_BATCH_ROWS: usize = 80;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS events (
    id          TEXT PRIMARY KEY,
    timestamp   TEXT NOT NULL,
    type        TEXT NOT NULL,
    object_id   TEXT,
    object_name TEXT,
    client_name TEXT,
    severity    TEXT NOT NULL,
    status      TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    location    TEXT,
    operator_id TEXT
);
CREATE INDEX IF NOT EXISTS idx_events_timestamp ON events (timestamp DESC);
CREATE INDEX IF NOT EXISTS idx_events_severity ON events (severity);

CREATE TABLE IF NOT EXISTS sync_state (
    key        TEXT PRIMARY KEY,
    value      TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS objects (
    id              TEXT PRIMARY KEY,
    name            TEXT NOT NULL,
    address         TEXT,
    client_name     TEXT,
    disabled        INTEGER NOT NULL DEFAULT 0,
    remarks         TEXT,
    additional_info TEXT,
    latitude        TEXT,
    longitude       TEXT,
    created_at      TEXT,
    updated_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS object_groups (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    object_id  TEXT NOT NULL,
    group_no   INTEGER NOT NULL,
    name       TEXT NOT NULL DEFAULT '',
    is_open    INTEGER,
    time_event TEXT
);
CREATE INDEX IF NOT EXISTS idx_object_groups_object ON object_groups (object_id);

CREATE TABLE IF NOT EXISTS responsibles (
    id        INTEGER PRIMARY KEY AUTOINCREMENT,
    object_id TEXT NOT NULL,
    group_no  INTEGER,
    order_no  INTEGER,
    name      TEXT NOT NULL DEFAULT '',
    address   TEXT
);
CREATE INDEX IF NOT EXISTS idx_responsibles_object ON responsibles (object_id);

CREATE TABLE IF NOT EXISTS responsible_phones (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    responsible_id INTEGER NOT NULL,
    phone          TEXT NOT NULL,
    type_name      TEXT
);
CREATE INDEX IF NOT EXISTS idx_responsible_phones_responsible ON responsible_phones (responsible_id);
"#;

/// SQLite-backed canonical store
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database file; `":memory:"` opens an in-memory
    /// store
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)
            .map_err(|e| SvodError::Store(format!("Failed to open SQLite database: {}", e)))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn event_params(event: &CanonicalEvent) -> Vec<Box<dyn rusqlite::ToSql + Send>> {
        vec![
            Box::new(event.id.clone()),
            Box::new(event.timestamp),
            Box::new(event.event_type.clone()),
            Box::new(event.object_id.clone()),
            Box::new(event.object_name.clone()),
            Box::new(event.client_name.clone()),
            Box::new(event.severity.as_str()),
            Box::new(event.status.as_str()),
            Box::new(event.description.clone()),
            Box::new(event.location.clone()),
            Box::new(event.operator_id.clone()),
        ]
    }
}

#[async_trait]
impl CanonicalStore for SqliteStore {
    async fn test_connection(&self) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.query_row("SELECT 1", [], |_| Ok(()))
            .map_err(|e| SvodError::Store(format!("Connection test failed: {}", e)))
    }

    async fn ensure_schema(&self) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute_batch(SCHEMA)
            .map_err(|e| SvodError::Store(format!("Failed to initialize schema: {}", e)))?;
        tracing::info!("SQLite schema initialized successfully");
        Ok(())
    }

    fn upsert_capability(&self) -> UpsertCapability {
        UpsertCapability::ChunkedConflictSkip {
            max_batch_rows: MAX_BATCH_ROWS,
        }
    }

    async fn insert_events_skip_conflicts(&self, events: &[CanonicalEvent]) -> Result<u64> {
        if events.is_empty() {
            return Ok(0);
        }
        debug_assert!(events.len() <= MAX_BATCH_ROWS);

        let row_placeholder = format!(
            "({})",
            vec!["?"; EVENT_COLUMN_COUNT].join(", ")
        );
        let statement = format!(
            "INSERT OR IGNORE INTO events (id, timestamp, type, object_id, object_name, \
                 client_name, severity, status, description, location, operator_id) \
             VALUES {}",
            vec![row_placeholder; events.len()].join(", ")
        );

        let values: Vec<Box<dyn rusqlite::ToSql + Send>> =
            events.iter().flat_map(Self::event_params).collect();

        let conn = self.conn.lock().await;
        let inserted = conn
            .execute(&statement, params_from_iter(values.iter()))
            .map_err(|e| SvodError::Store(format!("Bulk insert failed: {}", e)))?;
        Ok(inserted as u64)
    }

    async fn existing_event_ids(&self, ids: &[String]) -> Result<HashSet<String>> {
        if ids.is_empty() {
            return Ok(HashSet::new());
        }
        let statement = format!(
            "SELECT id FROM events WHERE id IN ({})",
            vec!["?"; ids.len()].join(", ")
        );
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare(&statement)
            .map_err(|e| SvodError::Store(e.to_string()))?;
        let existing = stmt
            .query_map(params_from_iter(ids.iter()), |row| row.get::<_, String>(0))
            .map_err(|e| SvodError::Store(e.to_string()))?
            .collect::<std::result::Result<HashSet<_>, _>>()
            .map_err(|e| SvodError::Store(e.to_string()))?;
        Ok(existing)
    }

    async fn insert_event(&self, event: &CanonicalEvent) -> Result<bool> {
        let values = Self::event_params(event);
        let conn = self.conn.lock().await;
        let inserted = conn
            .execute(
                "INSERT OR IGNORE INTO events (id, timestamp, type, object_id, object_name, \
                     client_name, severity, status, description, location, operator_id) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                params_from_iter(values.iter()),
            )
            .map_err(|e| SvodError::Store(format!("Insert failed: {}", e)))?;
        Ok(inserted == 1)
    }

    async fn get_cursor(&self, key: &str) -> Result<Option<SyncCursorRecord>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare("SELECT key, value, updated_at FROM sync_state WHERE key = ?")
            .map_err(|e| SvodError::Store(e.to_string()))?;
        let record = stmt
            .query_row(params![key], |row| {
                Ok(SyncCursorRecord {
                    key: row.get(0)?,
                    value: row.get(1)?,
                    updated_at: row.get(2)?,
                })
            })
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(SvodError::Store(other.to_string())),
            })?;
        Ok(record)
    }

    async fn set_cursor(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO sync_state (key, value, updated_at) VALUES (?, ?, ?) \
             ON CONFLICT (key) DO UPDATE SET value = excluded.value, \
                 updated_at = excluded.updated_at",
            params![key, value, Utc::now()],
        )
        .map_err(|e| SvodError::Store(format!("Failed to persist cursor: {}", e)))?;
        Ok(())
    }

    async fn all_cursors(&self) -> Result<Vec<SyncCursorRecord>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare("SELECT key, value, updated_at FROM sync_state ORDER BY key")
            .map_err(|e| SvodError::Store(e.to_string()))?;
        let records = stmt
            .query_map([], |row| {
                Ok(SyncCursorRecord {
                    key: row.get(0)?,
                    value: row.get(1)?,
                    updated_at: row.get(2)?,
                })
            })
            .map_err(|e| SvodError::Store(e.to_string()))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| SvodError::Store(e.to_string()))?;
        Ok(records)
    }

    async fn replace_object(
        &self,
        object: &FacilityObject,
        groups: &[ObjectGroup],
        responsibles: &[(Responsible, Vec<ResponsiblePhone>)],
    ) -> Result<()> {
        let mut conn = self.conn.lock().await;
        let tx = conn
            .transaction()
            .map_err(|e| SvodError::Store(format!("Failed to begin transaction: {}", e)))?;

        // Children first; phones are deleted through their responsibles.
        tx.execute(
            "DELETE FROM responsible_phones WHERE responsible_id IN \
                 (SELECT id FROM responsibles WHERE object_id = ?)",
            params![object.id],
        )
        .map_err(store_err)?;
        tx.execute(
            "DELETE FROM responsibles WHERE object_id = ?",
            params![object.id],
        )
        .map_err(store_err)?;
        tx.execute(
            "DELETE FROM object_groups WHERE object_id = ?",
            params![object.id],
        )
        .map_err(store_err)?;

        tx.execute(
            "INSERT INTO objects (id, name, address, client_name, disabled, remarks, \
                 additional_info, latitude, longitude, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT (id) DO UPDATE SET \
                 name = excluded.name, \
                 address = excluded.address, \
                 client_name = excluded.client_name, \
                 disabled = excluded.disabled, \
                 remarks = excluded.remarks, \
                 additional_info = excluded.additional_info, \
                 latitude = excluded.latitude, \
                 longitude = excluded.longitude, \
                 created_at = COALESCE(excluded.created_at, objects.created_at), \
                 updated_at = excluded.updated_at",
            params![
                object.id,
                object.name,
                object.address,
                object.client_name,
                object.disabled,
                object.remarks,
                object.additional_info,
                object.latitude,
                object.longitude,
                object.created_at,
                Utc::now(),
            ],
        )
        .map_err(store_err)?;

        for group in groups {
            tx.execute(
                "INSERT INTO object_groups (object_id, group_no, name, is_open, time_event) \
                 VALUES (?, ?, ?, ?, ?)",
                params![
                    group.object_id,
                    group.group_no,
                    group.name,
                    group.is_open,
                    group.time_event,
                ],
            )
            .map_err(store_err)?;
        }

        for (responsible, phones) in responsibles {
            // The generated id must exist before phone rows can reference it.
            tx.execute(
                "INSERT INTO responsibles (object_id, group_no, order_no, name, address) \
                 VALUES (?, ?, ?, ?, ?)",
                params![
                    responsible.object_id,
                    responsible.group_no,
                    responsible.order_no,
                    responsible.name,
                    responsible.address,
                ],
            )
            .map_err(store_err)?;
            let responsible_id = tx.last_insert_rowid();

            for phone in phones {
                tx.execute(
                    "INSERT INTO responsible_phones (responsible_id, phone, type_name) \
                     VALUES (?, ?, ?)",
                    params![responsible_id, phone.phone, phone.type_name],
                )
                .map_err(store_err)?;
            }
        }

        tx.commit()
            .map_err(|e| SvodError::Store(format!("Failed to commit transaction: {}", e)))
    }
}

fn store_err(e: rusqlite::Error) -> SvodError {
    SvodError::Store(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EventStatus, Severity};
    use chrono::TimeZone;

    async fn open_store() -> SqliteStore {
        let store = SqliteStore::open(":memory:").unwrap();
        store.ensure_schema().await.unwrap();
        store
    }

    fn event(id: &str) -> CanonicalEvent {
        CanonicalEvent {
            id: id.to_string(),
            timestamp: Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap(),
            event_type: "alarm".to_string(),
            object_id: None,
            object_name: Some("Объект 1".to_string()),
            client_name: None,
            severity: Severity::Info,
            status: EventStatus::Active,
            description: String::new(),
            location: None,
            operator_id: None,
        }
    }

    async fn count(store: &SqliteStore, sql: &str) -> i64 {
        let conn = store.conn.lock().await;
        conn.query_row(sql, [], |row| row.get(0)).unwrap()
    }

    #[tokio::test]
    async fn test_bulk_insert_skips_duplicates() {
        let store = open_store().await;
        let batch = vec![event("1"), event("2")];

        assert_eq!(store.insert_events_skip_conflicts(&batch).await.unwrap(), 2);
        assert_eq!(store.insert_events_skip_conflicts(&batch).await.unwrap(), 0);
        assert_eq!(count(&store, "SELECT COUNT(*) FROM events").await, 2);
    }

    #[tokio::test]
    async fn test_duplicate_with_different_fields_is_skipped() {
        let store = open_store().await;
        store.insert_event(&event("1")).await.unwrap();

        let mut changed = event("1");
        changed.severity = Severity::Critical;
        assert!(!store.insert_event(&changed).await.unwrap());
        assert_eq!(count(&store, "SELECT COUNT(*) FROM events").await, 1);
    }

    #[tokio::test]
    async fn test_existing_event_ids() {
        let store = open_store().await;
        store.insert_event(&event("1")).await.unwrap();

        let existing = store
            .existing_event_ids(&["1".to_string(), "2".to_string()])
            .await
            .unwrap();
        assert!(existing.contains("1"));
        assert!(!existing.contains("2"));
    }

    #[tokio::test]
    async fn test_cursor_round_trip() {
        let store = open_store().await;
        assert!(store.get_cursor("k").await.unwrap().is_none());

        store.set_cursor("k", "102").await.unwrap();
        let record = store.get_cursor("k").await.unwrap().unwrap();
        assert_eq!(record.value, "102");

        store.set_cursor("k", "205").await.unwrap();
        let record = store.get_cursor("k").await.unwrap().unwrap();
        assert_eq!(record.value, "205");
        assert_eq!(store.all_cursors().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_replace_object_leaves_no_orphans() {
        let store = open_store().await;

        let object = FacilityObject {
            id: "P1".to_string(),
            name: "Объект P1".to_string(),
            address: None,
            client_name: None,
            disabled: false,
            remarks: None,
            additional_info: None,
            latitude: None,
            longitude: None,
            created_at: None,
        };
        let stale_groups: Vec<ObjectGroup> = (1..=3)
            .map(|no| ObjectGroup {
                object_id: "P1".to_string(),
                group_no: no,
                name: format!("group {no}"),
                is_open: None,
                time_event: None,
            })
            .collect();
        store
            .replace_object(&object, &stale_groups, &[])
            .await
            .unwrap();
        assert_eq!(count(&store, "SELECT COUNT(*) FROM object_groups").await, 3);

        let responsible = Responsible {
            object_id: "P1".to_string(),
            group_no: Some(1),
            order_no: Some(1),
            name: "Иванов".to_string(),
            address: None,
        };
        let phones = vec![
            ResponsiblePhone {
                phone: "+7 111".to_string(),
                type_name: Some("type:1".to_string()),
            },
            ResponsiblePhone {
                phone: "+7 222".to_string(),
                type_name: None,
            },
        ];
        store
            .replace_object(&object, &[], &[(responsible, phones)])
            .await
            .unwrap();

        assert_eq!(count(&store, "SELECT COUNT(*) FROM objects").await, 1);
        assert_eq!(count(&store, "SELECT COUNT(*) FROM object_groups").await, 0);
        assert_eq!(count(&store, "SELECT COUNT(*) FROM responsibles").await, 1);
        assert_eq!(
            count(&store, "SELECT COUNT(*) FROM responsible_phones").await,
            2
        );
    }
}

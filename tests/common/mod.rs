//! Shared test doubles for integration tests

// Not every test binary uses every helper.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use svod_sync::adapters::agency::{EventSource, SourceFamily, UpstreamRow};
use svod_sync::adapters::store::{CanonicalStore, UpsertCapability};
use svod_sync::domain::{
    CanonicalEvent, FacilityObject, ObjectGroup, ObjectSnapshot, Responsible, ResponsiblePhone,
    Result, SourceCursor, SourceError, SvodError, SyncCursorRecord, ARCHIVE_CURSOR_KEY,
    LEDGER_CURSOR_KEY,
};

/// In-memory canonical store
///
/// Behaves like a conflict-skipping backend and supports injecting one
/// write failure to exercise cursor-ordering guarantees.
pub struct MemoryStore {
    capability: UpsertCapability,
    pub events: Mutex<HashMap<String, CanonicalEvent>>,
    pub cursors: Mutex<HashMap<String, SyncCursorRecord>>,
    pub replaced: Mutex<Vec<FacilityObject>>,
    fail_next_write: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_capability(UpsertCapability::BulkConflictSkip)
    }

    pub fn with_capability(capability: UpsertCapability) -> Self {
        Self {
            capability,
            events: Mutex::new(HashMap::new()),
            cursors: Mutex::new(HashMap::new()),
            replaced: Mutex::new(Vec::new()),
            fail_next_write: AtomicBool::new(false),
        }
    }

    /// Make the next event write fail once
    pub fn fail_next_write(&self) {
        self.fail_next_write.store(true, Ordering::SeqCst);
    }

    pub fn event_count(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn cursor_value(&self, key: &str) -> Option<String> {
        self.cursors
            .lock()
            .unwrap()
            .get(key)
            .map(|record| record.value.clone())
    }

    fn take_injected_failure(&self) -> Result<()> {
        if self.fail_next_write.swap(false, Ordering::SeqCst) {
            return Err(SvodError::Store("injected write failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl CanonicalStore for MemoryStore {
    async fn test_connection(&self) -> Result<()> {
        Ok(())
    }

    async fn ensure_schema(&self) -> Result<()> {
        Ok(())
    }

    fn upsert_capability(&self) -> UpsertCapability {
        self.capability
    }

    async fn insert_events_skip_conflicts(&self, events: &[CanonicalEvent]) -> Result<u64> {
        self.take_injected_failure()?;
        let mut stored = self.events.lock().unwrap();
        let mut inserted = 0;
        for event in events {
            if !stored.contains_key(&event.id) {
                stored.insert(event.id.clone(), event.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn existing_event_ids(&self, ids: &[String]) -> Result<HashSet<String>> {
        let stored = self.events.lock().unwrap();
        Ok(ids
            .iter()
            .filter(|id| stored.contains_key(*id))
            .cloned()
            .collect())
    }

    async fn insert_event(&self, event: &CanonicalEvent) -> Result<bool> {
        self.take_injected_failure()?;
        let mut stored = self.events.lock().unwrap();
        if stored.contains_key(&event.id) {
            return Ok(false);
        }
        stored.insert(event.id.clone(), event.clone());
        Ok(true)
    }

    async fn get_cursor(&self, key: &str) -> Result<Option<SyncCursorRecord>> {
        Ok(self.cursors.lock().unwrap().get(key).cloned())
    }

    async fn set_cursor(&self, key: &str, value: &str) -> Result<()> {
        self.cursors.lock().unwrap().insert(
            key.to_string(),
            SyncCursorRecord {
                key: key.to_string(),
                value: value.to_string(),
                updated_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn all_cursors(&self) -> Result<Vec<SyncCursorRecord>> {
        Ok(self.cursors.lock().unwrap().values().cloned().collect())
    }

    async fn replace_object(
        &self,
        object: &FacilityObject,
        _groups: &[ObjectGroup],
        _responsibles: &[(Responsible, Vec<ResponsiblePhone>)],
    ) -> Result<()> {
        self.replaced.lock().unwrap().push(object.clone());
        Ok(())
    }
}

/// Scripted upstream source
///
/// Serves a fixed row list filtered by cursor position, mimicking the
/// strictly-ascending delivery order of the real sources.
pub struct ScriptedSource {
    family: SourceFamily,
    rows: Vec<UpstreamRow>,
    snapshot: Option<ObjectSnapshot>,
    fail_fetch: AtomicBool,
}

impl ScriptedSource {
    pub fn ledger(rows: Vec<UpstreamRow>) -> Self {
        Self {
            family: SourceFamily::Ledger,
            rows,
            snapshot: None,
            fail_fetch: AtomicBool::new(false),
        }
    }

    pub fn archive(rows: Vec<UpstreamRow>, snapshot: Option<ObjectSnapshot>) -> Self {
        Self {
            family: SourceFamily::Archive,
            rows,
            snapshot,
            fail_fetch: AtomicBool::new(false),
        }
    }

    pub fn fail_next_fetch(&self) {
        self.fail_fetch.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl EventSource for ScriptedSource {
    fn family(&self) -> SourceFamily {
        self.family
    }

    fn cursor_key(&self) -> &'static str {
        match self.family {
            SourceFamily::Ledger => LEDGER_CURSOR_KEY,
            SourceFamily::Archive => ARCHIVE_CURSOR_KEY,
        }
    }

    fn default_cursor(&self) -> SourceCursor {
        match self.family {
            SourceFamily::Ledger => SourceCursor::Ledger(0),
            SourceFamily::Archive => SourceCursor::Archive {
                date_key: 20260101,
                event_id: 0,
            },
        }
    }

    fn parse_cursor(&self, raw: &str) -> Result<SourceCursor> {
        match self.family {
            SourceFamily::Ledger => SourceCursor::parse_ledger(raw),
            SourceFamily::Archive => SourceCursor::parse_archive(raw),
        }
    }

    async fn fetch_since(&self, cursor: SourceCursor, limit: u32) -> Result<Vec<UpstreamRow>> {
        if self.fail_fetch.swap(false, Ordering::SeqCst) {
            return Err(SourceError::QueryFailed("injected fetch failure".to_string()).into());
        }
        Ok(self
            .rows
            .iter()
            .filter(|row| row.position() > cursor)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    fn supports_reconciliation(&self) -> bool {
        self.snapshot.is_some()
    }

    async fn fetch_objects_snapshot(&self) -> Result<ObjectSnapshot> {
        match &self.snapshot {
            Some(snapshot) => Ok(snapshot.clone()),
            None => Err(SourceError::Unsupported(
                "scripted source has no snapshot".to_string(),
            )
            .into()),
        }
    }
}

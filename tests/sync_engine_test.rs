//! Integration tests for the sync engine
//!
//! Exercises full fetch → map → write → cursor cycles against an in-memory
//! store and a scripted source.

mod common;

use chrono::NaiveDate;
use common::{MemoryStore, ScriptedSource};
use std::sync::Arc;
use svod_sync::adapters::agency::{ArchiveEventRow, LedgerAlarmRow, UpstreamRow};
use svod_sync::adapters::store::CanonicalStore;
use svod_sync::config::{StoreTarget, SvodConfig};
use svod_sync::core::sync::SyncEngine;
use svod_sync::domain::{
    ObjectSnapshot, Severity, SnapshotObject, ARCHIVE_CURSOR_KEY, LEDGER_CURSOR_KEY,
};

fn test_config() -> SvodConfig {
    SvodConfig {
        application: Default::default(),
        agency: Default::default(),
        store_target: StoreTarget::Sqlite,
        postgresql: None,
        sqlite: None,
        sync: Default::default(),
        logging: Default::default(),
    }
}

fn ledger_row(id: i64) -> UpstreamRow {
    UpstreamRow::Ledger(LedgerAlarmRow {
        id,
        timestamp: Some(
            NaiveDate::from_ymd_opt(2026, 1, 15)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
        ),
        ..Default::default()
    })
}

fn archive_row(date_key: u32, event_id: i64) -> UpstreamRow {
    UpstreamRow::Archive(ArchiveEventRow {
        date_key,
        event_id,
        timestamp: Some(
            NaiveDate::from_ymd_opt(2026, 1, 15)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap(),
        ),
        panel_id: Some("P1".to_string()),
        ..Default::default()
    })
}

fn snapshot_object(panel_id: &str) -> SnapshotObject {
    SnapshotObject {
        panel_id: panel_id.to_string(),
        company_name: None,
        company_address: None,
        company_memo: None,
        disabled: false,
        remarks: None,
        additional_info: None,
        latitude: None,
        longitude: None,
        created_at: None,
    }
}

#[tokio::test]
async fn test_ledger_cycle_end_to_end() {
    let store = Arc::new(MemoryStore::new());
    let loss_row = LedgerAlarmRow {
        id: 102,
        timestamp: Some(
            NaiveDate::from_ymd_opt(2026, 1, 15)
                .unwrap()
                .and_hms_opt(10, 5, 0)
                .unwrap(),
        ),
        is_loss: true,
        ..Default::default()
    };
    let source = Arc::new(ScriptedSource::ledger(vec![
        ledger_row(101),
        UpstreamRow::Ledger(loss_row),
    ]));

    let engine = SyncEngine::new(Some(source), store.clone(), &test_config());
    let report = engine.sync_events().await.unwrap();

    assert_eq!(report.status, "ok");
    assert_eq!(report.processed, 2);
    assert_eq!(report.cursor.as_deref(), Some("102"));
    assert_eq!(store.event_count(), 2);
    assert_eq!(
        store.cursor_value(LEDGER_CURSOR_KEY).as_deref(),
        Some("102")
    );

    let cursors = engine.cursor_status().await.unwrap();
    assert_eq!(cursors.len(), 1);
    assert_eq!(cursors[0].key, LEDGER_CURSOR_KEY);
    assert_eq!(cursors[0].value, "102");

    let events = store.events.lock().unwrap();
    assert_eq!(events["101"].severity, Severity::Info);
    assert_eq!(events["102"].severity, Severity::Critical);
}

#[tokio::test]
async fn test_replayed_rows_are_not_duplicated() {
    let store = Arc::new(MemoryStore::new());
    let source = Arc::new(ScriptedSource::ledger(vec![
        ledger_row(101),
        ledger_row(102),
    ]));
    let engine = SyncEngine::new(Some(source), store.clone(), &test_config());

    assert_eq!(engine.sync_events().await.unwrap().processed, 2);

    // Forget the watermark so the same rows are fetched again.
    store.cursors.lock().unwrap().clear();
    let replay = engine.sync_events().await.unwrap();

    assert_eq!(replay.processed, 0);
    assert_eq!(store.event_count(), 2);
    assert_eq!(
        store.cursor_value(LEDGER_CURSOR_KEY).as_deref(),
        Some("102")
    );
}

#[tokio::test]
async fn test_cursor_is_not_advanced_when_write_fails() {
    let store = Arc::new(MemoryStore::new());
    let source = Arc::new(ScriptedSource::ledger(vec![ledger_row(101)]));
    let engine = SyncEngine::new(Some(source), store.clone(), &test_config());

    store.fail_next_write();
    assert!(engine.sync_events().await.is_err());
    assert_eq!(store.cursor_value(LEDGER_CURSOR_KEY), None);
    assert_eq!(store.event_count(), 0);

    // The next cycle re-delivers and lands the same rows.
    let report = engine.sync_events().await.unwrap();
    assert_eq!(report.processed, 1);
    assert_eq!(
        store.cursor_value(LEDGER_CURSOR_KEY).as_deref(),
        Some("101")
    );
}

#[tokio::test]
async fn test_fetch_failure_leaves_cursor_untouched() {
    let store = Arc::new(MemoryStore::new());
    store.set_cursor(LEDGER_CURSOR_KEY, "50").await.unwrap();
    let source = Arc::new(ScriptedSource::ledger(vec![ledger_row(101)]));
    source.fail_next_fetch();
    let engine = SyncEngine::new(Some(source), store.clone(), &test_config());

    assert!(engine.sync_events().await.is_err());
    assert_eq!(store.cursor_value(LEDGER_CURSOR_KEY).as_deref(), Some("50"));
}

#[tokio::test]
async fn test_unmappable_row_still_advances_cursor() {
    let store = Arc::new(MemoryStore::new());
    let source = Arc::new(ScriptedSource::ledger(vec![
        ledger_row(101),
        // No usable timestamp: the mapper drops it, the cursor keeps going.
        UpstreamRow::Ledger(LedgerAlarmRow {
            id: 102,
            timestamp: None,
            ..Default::default()
        }),
    ]));
    let engine = SyncEngine::new(Some(source), store.clone(), &test_config());

    let report = engine.sync_events().await.unwrap();
    assert_eq!(report.processed, 1);
    assert_eq!(report.cursor.as_deref(), Some("102"));
    assert_eq!(store.event_count(), 1);
}

#[tokio::test]
async fn test_empty_fetch_reports_existing_cursor() {
    let store = Arc::new(MemoryStore::new());
    store.set_cursor(LEDGER_CURSOR_KEY, "200").await.unwrap();
    let source = Arc::new(ScriptedSource::ledger(vec![ledger_row(101)]));
    let engine = SyncEngine::new(Some(source), store.clone(), &test_config());

    let report = engine.sync_events().await.unwrap();
    assert_eq!(report.status, "ok");
    assert_eq!(report.processed, 0);
    assert_eq!(report.cursor.as_deref(), Some("200"));
}

#[tokio::test]
async fn test_unconfigured_source_is_skipped() {
    let store = Arc::new(MemoryStore::new());
    let engine = SyncEngine::new(None, store.clone(), &test_config());

    let events = engine.sync_events().await.unwrap();
    assert_eq!(events.status, "skipped");
    assert!(events.reason.is_some());

    let objects = engine.sync_objects().await.unwrap();
    assert_eq!(objects.status, "skipped");
}

#[tokio::test]
async fn test_archive_cycle_advances_composite_cursor() {
    let store = Arc::new(MemoryStore::new());
    let source = Arc::new(ScriptedSource::archive(
        vec![archive_row(20260114, 900), archive_row(20260115, 3)],
        None,
    ));
    let engine = SyncEngine::new(Some(source), store.clone(), &test_config());

    let report = engine.sync_events().await.unwrap();
    assert_eq!(report.processed, 2);
    assert_eq!(report.cursor.as_deref(), Some("20260115:3"));
    assert_eq!(
        store.cursor_value(ARCHIVE_CURSOR_KEY).as_deref(),
        Some("20260115:3")
    );
    assert!(store.events.lock().unwrap().contains_key("mssql:20260115:3"));
}

#[tokio::test]
async fn test_sync_objects_reconciles_snapshot() {
    let mut snapshot = ObjectSnapshot::default();
    snapshot.objects.push(snapshot_object("P1"));
    snapshot.objects.push(snapshot_object("P2"));

    let store = Arc::new(MemoryStore::new());
    let source = Arc::new(ScriptedSource::archive(Vec::new(), Some(snapshot)));
    let engine = SyncEngine::new(Some(source), store.clone(), &test_config());

    let report = engine.sync_objects().await.unwrap();
    assert_eq!(report.status, "ok");
    assert_eq!(report.objects, 2);
    assert_eq!(report.failed, 0);
    assert_eq!(report.source_objects, 2);
    assert_eq!(store.replaced.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_sync_objects_skipped_without_snapshot_support() {
    let store = Arc::new(MemoryStore::new());
    let source = Arc::new(ScriptedSource::ledger(Vec::new()));
    let engine = SyncEngine::new(Some(source), store, &test_config());

    let report = engine.sync_objects().await.unwrap();
    assert_eq!(report.status, "skipped");
    assert!(report.reason.unwrap().contains("snapshot"));
}

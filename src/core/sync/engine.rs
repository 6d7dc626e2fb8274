//! Sync engine
//!
//! Runs single sync cycles against the configured source and store. A
//! process-wide async lock serializes cycles, so a manual CLI trigger and
//! the background loop never interleave writes or cursor commits. The
//! cursor is committed strictly after the batch it covers is durably
//! written; a crash between the two re-delivers rows that the idempotent
//! writer then skips.

use crate::adapters::agency::traits::EventSource;
use crate::adapters::store::CanonicalStore;
use crate::config::SvodConfig;
use crate::core::cursor::CursorStore;
use crate::core::mapper::map_row;
use crate::core::reconcile::ObjectReconciler;
use crate::core::sync::report::{EventsSyncReport, ObjectsSyncReport, STATUS_OK};
use crate::core::writer::EventWriter;
use crate::domain::{Result, SourceError, SyncCursorRecord};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

const REASON_UNCONFIGURED: &str = "agency url is not configured";
const REASON_NO_SNAPSHOTS: &str = "source does not provide object snapshots";

pub struct SyncEngine {
    source: Option<Arc<dyn EventSource>>,
    store: Arc<dyn CanonicalStore>,
    cursors: CursorStore,
    writer: EventWriter,
    reconciler: ObjectReconciler,
    lock: Mutex<()>,
    events_limit: u32,
    fetch_timeout: Duration,
}

impl SyncEngine {
    pub fn new(
        source: Option<Arc<dyn EventSource>>,
        store: Arc<dyn CanonicalStore>,
        config: &SvodConfig,
    ) -> Self {
        Self {
            source,
            cursors: CursorStore::new(store.clone()),
            writer: EventWriter::new(store.clone()),
            reconciler: ObjectReconciler::new(store.clone()),
            store,
            lock: Mutex::new(()),
            events_limit: config.sync.events_limit,
            fetch_timeout: Duration::from_secs(config.agency.fetch_timeout_seconds),
        }
    }

    /// Whether the configured source can produce facility snapshots
    pub fn supports_reconciliation(&self) -> bool {
        self.source
            .as_ref()
            .is_some_and(|s| s.supports_reconciliation())
    }

    /// Run one event sync cycle
    ///
    /// # Errors
    ///
    /// Returns an error when the fetch or the store write fails. The cursor
    /// is left untouched in that case.
    pub async fn sync_events(&self) -> Result<EventsSyncReport> {
        let _guard = self.lock.lock().await;

        let source = match &self.source {
            Some(source) => source,
            None => return Ok(EventsSyncReport::skipped(REASON_UNCONFIGURED)),
        };

        let cursor = self.cursors.load(source.as_ref()).await?;
        debug!(family = source.family().as_str(), %cursor, "Fetching events");

        let rows = tokio::time::timeout(
            self.fetch_timeout,
            source.fetch_since(cursor, self.events_limit),
        )
        .await
        .map_err(|_| {
            SourceError::Timeout(format!(
                "fetch exceeded {}s",
                self.fetch_timeout.as_secs()
            ))
        })??;

        if rows.is_empty() {
            return Ok(EventsSyncReport::ok(0, cursor.encode()));
        }

        // Rows arrive in ascending cursor order; the batch watermark is the
        // last row's position, including rows the mapper drops.
        let mut next_cursor = cursor;
        let mut events = Vec::with_capacity(rows.len());
        for row in &rows {
            next_cursor = row.position();
            match map_row(row) {
                Ok(event) => events.push(event),
                Err(error) => warn!(%error, "Dropping unmappable row"),
            }
        }

        let inserted = self.writer.write(&events).await?;
        self.cursors.commit(source.as_ref(), next_cursor).await?;

        info!(
            fetched = rows.len(),
            inserted,
            cursor = %next_cursor,
            "Event sync cycle complete"
        );
        Ok(EventsSyncReport::ok(inserted, next_cursor.encode()))
    }

    /// Run one facility object reconciliation cycle
    ///
    /// # Errors
    ///
    /// Returns an error when the snapshot fetch fails outright. Individual
    /// object failures are counted in the report instead.
    pub async fn sync_objects(&self) -> Result<ObjectsSyncReport> {
        let _guard = self.lock.lock().await;

        let source = match &self.source {
            Some(source) => source,
            None => return Ok(ObjectsSyncReport::skipped(REASON_UNCONFIGURED)),
        };
        if !source.supports_reconciliation() {
            return Ok(ObjectsSyncReport::skipped(REASON_NO_SNAPSHOTS));
        }

        let snapshot = tokio::time::timeout(self.fetch_timeout, source.fetch_objects_snapshot())
            .await
            .map_err(|_| {
                SourceError::Timeout(format!(
                    "snapshot fetch exceeded {}s",
                    self.fetch_timeout.as_secs()
                ))
            })??;

        let outcome = self.reconciler.reconcile(&snapshot).await;
        info!(
            reconciled = outcome.reconciled,
            failed = outcome.failed,
            source_objects = snapshot.objects.len(),
            "Object sync cycle complete"
        );

        Ok(ObjectsSyncReport {
            status: STATUS_OK.to_string(),
            objects: outcome.reconciled,
            failed: outcome.failed,
            source_objects: snapshot.objects.len(),
            source_groups: snapshot.groups.len(),
            source_responsibles: snapshot.responsibles.len(),
            source_phones: snapshot.phones.len(),
            reason: None,
        })
    }

    /// All persisted sync watermarks
    pub async fn cursor_status(&self) -> Result<Vec<SyncCursorRecord>> {
        self.store.all_cursors().await
    }
}

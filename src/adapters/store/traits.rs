//! Canonical store abstraction
//!
//! The engine is the sole writer of the canonical tables. Backends differ
//! in their bulk conflict-skip support, which the upsert writer adapts to
//! via [`UpsertCapability`].

use crate::domain::{
    CanonicalEvent, FacilityObject, ObjectGroup, Responsible, ResponsiblePhone, Result,
    SyncCursorRecord,
};
use async_trait::async_trait;
use std::collections::HashSet;

/// How a backend handles "insert, skip on primary-key conflict"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertCapability {
    /// Native conflict-skip in one bulk statement, no bind-count ceiling
    BulkConflictSkip,
    /// Native conflict-skip, but bulk statements are bounded by a
    /// bind-variable ceiling and must be chunked (PostgreSQL's u16 wire
    /// parameter count, SQLite's 999 variable default)
    ChunkedConflictSkip { max_batch_rows: usize },
    /// No conflict-skip: query already-present ids first, insert the
    /// complement row by row
    ProbeBeforeInsert,
}

/// Canonical store trait
///
/// All writes for one sync cycle go through one store instance. Cursor rows
/// live in the same store so the engine's "write batch, then advance
/// cursor" ordering holds against a single durable target.
#[async_trait]
pub trait CanonicalStore: Send + Sync {
    /// Test the store connection
    async fn test_connection(&self) -> Result<()>;

    /// Ensure the canonical schema exists, creating it if necessary
    async fn ensure_schema(&self) -> Result<()>;

    /// The backend's conflict-skip capability
    fn upsert_capability(&self) -> UpsertCapability;

    /// Insert events, skipping rows whose id is already present
    ///
    /// Returns the number of rows actually newly persisted. Backends without
    /// native conflict-skip do not implement this; the writer probes instead.
    async fn insert_events_skip_conflicts(&self, events: &[CanonicalEvent]) -> Result<u64>;

    /// Which of the given ids already exist
    async fn existing_event_ids(&self, ids: &[String]) -> Result<HashSet<String>>;

    /// Insert one event; returns false when the id was already present
    async fn insert_event(&self, event: &CanonicalEvent) -> Result<bool>;

    /// Load a persisted cursor row
    async fn get_cursor(&self, key: &str) -> Result<Option<SyncCursorRecord>>;

    /// Persist a cursor value (insert or update)
    async fn set_cursor(&self, key: &str, value: &str) -> Result<()>;

    /// All persisted cursor rows
    async fn all_cursors(&self) -> Result<Vec<SyncCursorRecord>>;

    /// Replace one facility object and its children in one atomic unit
    ///
    /// Deletes the object's existing groups and responsible parties (phones
    /// cascade), upserts the parent row in place, then inserts the fresh
    /// children. Each responsible's generated id is obtained before its
    /// phone rows are inserted.
    async fn replace_object(
        &self,
        object: &FacilityObject,
        groups: &[ObjectGroup],
        responsibles: &[(Responsible, Vec<ResponsiblePhone>)],
    ) -> Result<()>;
}

//! Idempotent event writer
//!
//! Persists a mapped batch so that replaying the same rows never produces
//! duplicates. The write strategy follows the backend's declared
//! [`UpsertCapability`] rather than hard-coding a dialect.

use crate::adapters::store::{CanonicalStore, UpsertCapability};
use crate::domain::{CanonicalEvent, Result};
use std::sync::Arc;

/// Writes canonical event batches through the configured store
pub struct EventWriter {
    store: Arc<dyn CanonicalStore>,
}

impl EventWriter {
    pub fn new(store: Arc<dyn CanonicalStore>) -> Self {
        Self { store }
    }

    /// Persist a batch, skipping events whose id is already present
    ///
    /// Returns the number of rows newly inserted.
    ///
    /// # Errors
    ///
    /// Returns an error when the store rejects a write. Nothing about the
    /// batch is retried here; the caller decides whether to advance its
    /// cursor.
    pub async fn write(&self, events: &[CanonicalEvent]) -> Result<u64> {
        if events.is_empty() {
            return Ok(0);
        }

        match self.store.upsert_capability() {
            UpsertCapability::BulkConflictSkip => {
                self.store.insert_events_skip_conflicts(events).await
            }
            UpsertCapability::ChunkedConflictSkip { max_batch_rows } => {
                let mut inserted = 0;
                for chunk in events.chunks(max_batch_rows.max(1)) {
                    inserted += self.store.insert_events_skip_conflicts(chunk).await?;
                }
                Ok(inserted)
            }
            UpsertCapability::ProbeBeforeInsert => {
                let ids: Vec<String> = events.iter().map(|e| e.id.clone()).collect();
                let existing = self.store.existing_event_ids(&ids).await?;

                let mut inserted = 0;
                for event in events.iter().filter(|e| !existing.contains(&e.id)) {
                    if self.store.insert_event(event).await? {
                        inserted += 1;
                    }
                }
                Ok(inserted)
            }
        }
    }
}

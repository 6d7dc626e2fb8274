//! Cursor persistence
//!
//! Thin layer between a source's cursor codec and the store's `sync_state`
//! rows. A corrupted persisted value falls back to the source's default
//! cursor rather than wedging the sync loop.

use crate::adapters::agency::traits::EventSource;
use crate::adapters::store::CanonicalStore;
use crate::domain::{Result, SourceCursor};
use std::sync::Arc;
use tracing::warn;

/// Loads and commits per-source watermarks
pub struct CursorStore {
    store: Arc<dyn CanonicalStore>,
}

impl CursorStore {
    pub fn new(store: Arc<dyn CanonicalStore>) -> Self {
        Self { store }
    }

    /// Load the source's watermark, falling back to its default cursor when
    /// none is persisted or the persisted value does not decode
    pub async fn load(&self, source: &dyn EventSource) -> Result<SourceCursor> {
        match self.store.get_cursor(source.cursor_key()).await? {
            Some(record) => match source.parse_cursor(&record.value) {
                Ok(cursor) => Ok(cursor),
                Err(error) => {
                    warn!(
                        key = source.cursor_key(),
                        value = %record.value,
                        %error,
                        "Persisted cursor did not decode, starting from default"
                    );
                    Ok(source.default_cursor())
                }
            },
            None => Ok(source.default_cursor()),
        }
    }

    /// Persist the source's watermark
    ///
    /// Called strictly after the batch it covers is durably written.
    pub async fn commit(&self, source: &dyn EventSource, cursor: SourceCursor) -> Result<()> {
        self.store
            .set_cursor(source.cursor_key(), &cursor.encode())
            .await
    }
}

//! Canonical store factory
//!
//! Creates the configured [`CanonicalStore`] backend.

use crate::adapters::store::postgres::{PostgresClient, PostgresStore};
use crate::adapters::store::sqlite::SqliteStore;
use crate::adapters::store::traits::CanonicalStore;
use crate::config::{StoreTarget, SvodConfig};
use crate::domain::Result;
use std::sync::Arc;

/// Create a canonical store based on the configuration
///
/// # Errors
///
/// Returns an error if the store cannot be created.
pub fn create_store(config: &SvodConfig) -> Result<Arc<dyn CanonicalStore>> {
    match config.store_target {
        StoreTarget::PostgreSQL => {
            let pg_config = config
                .postgresql
                .as_ref()
                .expect("PostgreSQL config should be validated");

            tracing::info!("Creating PostgreSQL canonical store");
            let client = PostgresClient::new(pg_config.clone())?;
            Ok(Arc::new(PostgresStore::new(client)) as Arc<dyn CanonicalStore>)
        }
        StoreTarget::Sqlite => {
            let sqlite_config = config
                .sqlite
                .as_ref()
                .expect("SQLite config should be validated");

            tracing::info!(path = %sqlite_config.path, "Creating SQLite canonical store");
            let store = SqliteStore::open(&sqlite_config.path)?;
            Ok(Arc::new(store) as Arc<dyn CanonicalStore>)
        }
    }
}

//! Upstream source factory
//!
//! Builds the configured [`EventSource`] implementation from the agency URL.
//! An unset URL is not an error: sync operations report `skipped` instead.

use crate::adapters::agency::address::AgencyAddress;
use crate::adapters::agency::archive::ArchiveSource;
use crate::adapters::agency::ledger::LedgerSource;
use crate::adapters::agency::traits::EventSource;
use crate::config::AgencyConfig;
use crate::domain::Result;
use secrecy::ExposeSecret;
use std::sync::Arc;

/// Create the upstream event source selected by the agency URL scheme
///
/// Returns `Ok(None)` when no agency URL is configured.
///
/// # Errors
///
/// Returns a configuration error when the URL cannot be resolved into a
/// valid address.
pub fn create_event_source(config: &AgencyConfig) -> Result<Option<Arc<dyn EventSource>>> {
    let url = match config.url {
        Some(ref url) => url.expose_secret(),
        None => return Ok(None),
    };

    match AgencyAddress::resolve(url.as_ref())? {
        AgencyAddress::MySql(address) => {
            tracing::info!(host = %address.host, database = %address.database, "Creating ledger source");
            Ok(Some(Arc::new(LedgerSource::new(&address))))
        }
        AgencyAddress::MsSql(address) => {
            tracing::info!(host = %address.host, database = %address.database, "Creating archive source");
            let source = ArchiveSource::new(
                address,
                config.archives_database.clone(),
                config.archive_start_date_key,
            )?;
            Ok(Some(Arc::new(source)))
        }
    }
}

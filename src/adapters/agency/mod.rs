//! Upstream agency source adapters
//!
//! Two incompatible upstream schemas sit behind one capability trait:
//! the MySQL alarms ledger ([`ledger::LedgerSource`]) and the
//! monthly-partitioned MSSQL archive ([`archive::ArchiveSource`]). The
//! factory picks the implementation from the agency URL scheme.

pub mod address;
pub mod archive;
pub mod factory;
pub mod ledger;
pub mod rows;
pub mod traits;

pub use address::{AgencyAddress, MsSqlAddress, MySqlAddress};
pub use factory::create_event_source;
pub use rows::{ArchiveEventRow, LedgerAlarmRow, UpstreamRow};
pub use traits::{EventSource, SourceFamily};

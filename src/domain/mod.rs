//! Core domain types and models

pub mod cursor;
pub mod errors;
pub mod event;
pub mod object;
pub mod result;

pub use cursor::{SourceCursor, SyncCursorRecord, ARCHIVE_CURSOR_KEY, LEDGER_CURSOR_KEY};
pub use errors::{SourceError, SvodError};
pub use event::{CanonicalEvent, EventStatus, Severity};
pub use object::{
    FacilityObject, ObjectGroup, ObjectSnapshot, Responsible, ResponsiblePhone, SnapshotGroup,
    SnapshotObject, SnapshotPhone, SnapshotResponsible,
};
pub use result::Result;

//! Core synchronization pipeline
//!
//! Pure mapping plus the stateful pieces that drive it: cursor persistence,
//! the idempotent writer, object reconciliation, and the sync loop itself.

pub mod cursor;
pub mod mapper;
pub mod reconcile;
pub mod sync;
pub mod writer;

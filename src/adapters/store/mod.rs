//! Canonical store adapters
//!
//! The dashboard-facing store sits behind the [`traits::CanonicalStore`]
//! trait with PostgreSQL and embedded SQLite backends.

pub mod factory;
pub mod postgres;
pub mod sqlite;
pub mod traits;

pub use factory::create_store;
pub use traits::{CanonicalStore, UpsertCapability};

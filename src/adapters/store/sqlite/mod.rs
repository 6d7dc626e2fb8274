//! SQLite canonical store backend

pub mod store;

pub use store::SqliteStore;

// svod-sync - Agency Alarm Synchronization Engine
// Copyright (c) 2026 svod-sync Contributors
// Licensed under the MIT License

//! # svod-sync - Agency Alarm Synchronization Engine
//!
//! svod-sync pulls security-alarm events and facility metadata from an
//! agency's upstream databases and maintains a canonical, dashboard-facing
//! copy of them.
//!
//! ## Overview
//!
//! This library provides the core functionality for:
//! - **Fetching** alarm rows from two upstream families: a MySQL alarm
//!   ledger and monthly-partitioned MSSQL archive tables
//! - **Mapping** raw rows into one canonical event shape with stable,
//!   per-source namespaced ids
//! - **Writing** event batches idempotently and advancing a durable cursor
//!   only after the batch has landed
//! - **Reconciling** facility objects, groups, responsible parties, and
//!   phone numbers from full upstream snapshots
//!
//! ## Architecture
//!
//! svod-sync follows a layered architecture:
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Business logic (mapper, writer, cursors, reconciler, sync loop)
//! - [`adapters`] - External integrations (agency sources, canonical stores)
//! - [`domain`] - Core domain types and models
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging and observability
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use svod_sync::adapters::agency::create_event_source;
//! use svod_sync::adapters::store::{create_store, CanonicalStore};
//! use svod_sync::config::load_config;
//! use svod_sync::core::sync::SyncEngine;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("svod-sync.toml")?;
//!
//!     let store = create_store(&config)?;
//!     store.ensure_schema().await?;
//!     let source = create_event_source(&config.agency)?;
//!
//!     let engine = SyncEngine::new(source, store, &config);
//!     let report = engine.sync_events().await?;
//!
//!     println!("Processed {} events", report.processed);
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! svod-sync uses the [`domain::SvodError`] type for all errors:
//!
//! ```rust,no_run
//! use svod_sync::domain::SvodError;
//!
//! fn example() -> Result<(), SvodError> {
//!     let config = svod_sync::config::load_config("svod-sync.toml")?;
//!     Ok(())
//! }
//! ```
//!
//! ## Logging
//!
//! svod-sync uses structured logging with the `tracing` crate:
//!
//! ```rust,no_run
//! use tracing::{info, warn};
//!
//! info!("Starting sync cycle");
//! warn!(object_id = "P17", "Object reconciliation failed");
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;

//! Configuration management.
//!
//! TOML-based configuration loading, parsing, and validation with support
//! for environment variable substitution (`${VAR_NAME}`), `SVOD_*` overrides,
//! default values for optional settings, and type-safe configuration structs.
//!
//! # Example Configuration
//!
//! ```toml
//! store_target = "postgresql"
//!
//! [application]
//! log_level = "info"
//!
//! [agency]
//! url = "${SVOD_AGENCY_URL}"
//! archives_database = "pult4db_archives"
//!
//! [postgresql]
//! connection_string = "${SVOD_POSTGRESQL_CONNECTION_STRING}"
//!
//! [sync]
//! interval_seconds = 30
//! events_limit = 500
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::load_config;
pub use schema::{
    AgencyConfig, ApplicationConfig, LoggingConfig, PostgreSQLConfig, SqliteConfig, StoreTarget,
    SvodConfig, SyncConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};

//! Logging and observability
//!
//! Structured logging with JSON-formatted file output, configurable log
//! levels, and local file rotation.
//!
//! # Example
//!
//! ```no_run
//! use svod_sync::logging::init_logging;
//! use svod_sync::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod structured;

// Re-export commonly used items
pub use structured::{init_logging, LoggingGuard};

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use svod_sync::log_error_with_context;
/// use svod_sync::domain::SvodError;
///
/// let error = SvodError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}

/// Log the outcome of a sync cycle
///
/// # Example
///
/// ```no_run
/// use svod_sync::log_sync_cycle;
/// use std::time::Duration;
///
/// let processed = 42;
/// let duration = Duration::from_secs(2);
/// log_sync_cycle!("events", processed, duration);
/// ```
#[macro_export]
macro_rules! log_sync_cycle {
    ($kind:expr, $processed:expr, $duration:expr) => {
        tracing::info!(
            kind = $kind,
            processed = $processed,
            duration_ms = $duration.as_millis(),
            "Sync cycle finished"
        );
    };
}

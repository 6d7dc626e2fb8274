//! Domain error types
//!
//! All errors are domain-specific and don't expose third-party driver types.

use thiserror::Error;

/// Main error type for the sync engine
///
/// This is the primary error type used throughout the application.
/// It wraps specific error types and provides context for error handling.
#[derive(Debug, Error)]
pub enum SvodError {
    /// Configuration-related errors (bad connection URL, missing fields).
    /// Fatal to the attempted cycle; recurs every tick until fixed.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Transient upstream fetch errors (network/driver failure mid-fetch).
    /// The current cycle is abandoned without advancing the cursor.
    #[error("Agency source error: {0}")]
    Source(#[from] SourceError),

    /// Canonical store errors
    #[error("Store error: {0}")]
    Store(String),

    /// A single row's fields could not be normalized (e.g. unparseable
    /// timestamp). The row is dropped; the batch continues.
    #[error("Mapping error: {0}")]
    Mapping(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// Agency-source-specific errors
///
/// Errors that occur when talking to the upstream agency databases.
/// These errors don't expose the mysql/tds driver types.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Failed to connect to the agency database
    #[error("Failed to connect to agency database: {0}")]
    ConnectionFailed(String),

    /// Query failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Fetch exceeded the configured deadline
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// Row decoding failed (unexpected column type from the driver)
    #[error("Invalid row data: {0}")]
    InvalidRow(String),

    /// The configured source family does not provide this operation
    /// (e.g. object snapshots from the ledger source)
    #[error("Operation not supported by this source: {0}")]
    Unsupported(String),
}

// Conversion from std::io::Error
impl From<std::io::Error> for SvodError {
    fn from(err: std::io::Error) -> Self {
        SvodError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for SvodError {
    fn from(err: serde_json::Error) -> Self {
        SvodError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for SvodError {
    fn from(err: toml::de::Error) -> Self {
        SvodError::Configuration(format!("TOML parse error: {err}"))
    }
}

//! Common types and utilities shared across the trend report crates.
//!
//! - [`observability`]: rolling-file plus stderr `tracing` setup
//! - [`ReportError`] and [`Result`]: the error type of the report pipeline
//!
//! # Examples
//!
//! ```rust
//! use trendreport_common::{ReportError, Result};
//!
//! fn require_key(key: Option<&str>) -> Result<&str> {
//!     key.ok_or_else(|| ReportError::Config("missing API key".to_string()))
//! }
//!
//! assert!(require_key(None).is_err());
//! assert_eq!(require_key(Some("k")).unwrap(), "k");
//! ```

pub mod observability;

/// Error types used across the trend report pipeline.
#[derive(thiserror::Error, Debug)]
pub enum ReportError {
    /// The completion API call failed (transport, status, or decode).
    #[error("Completion error: {0}")]
    Completion(String),

    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Reading a prompt file or writing the report failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Prompt data could not be serialized.
    #[error("Serialization error: {0}")]
    Serialize(String),
}

/// Convenient alias for results that use [`ReportError`].
pub type Result<T> = std::result::Result<T, ReportError>;

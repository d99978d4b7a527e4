//! Error types for the persistence layer.
//!
//! Only genuine I/O problems surface as [`StoreError`]. A value that cannot be
//! decoded is never an error: the codec in [`crate::kv`] degrades it to "no
//! data" and logs a warning.

use thiserror::Error;

/// A write to the backing store did not commit.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to write `{key}`: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode `{key}`: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
}

/// Rejected entity input. Raised at the UI boundary, never by repositories.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{0} is not valid")]
    Invalid(&'static str),

    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: &'static str,
        min: i64,
        max: i64,
    },

    #[error("{0} must be positive")]
    NotPositive(&'static str),

    #[error("{0} must not be negative")]
    Negative(&'static str),
}

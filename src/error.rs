//! Error types for canonical container operations.

use crate::value::Value;

/// Recoverable, caller-facing failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Keyed lookup without a default found nothing.
    #[error("key not found: {key:?}")]
    NotFound {
        /// The missing key.
        key: Value,
    },
    /// Sequence index outside `[0, len)`.
    #[error("index {index} out of range (len={len})")]
    IndexOutOfRange {
        /// The requested index.
        index: usize,
        /// Length of the sequence.
        len: usize,
    },
    /// Linear search found no strictly-equal element.
    #[error("{value:?} is not in the sequence")]
    ValueNotFound {
        /// The value searched for.
        value: Value,
    },
    /// Content that cannot be represented on the requested side of a
    /// conversion (non-text map key in JSON, opaque object, ...).
    #[error("unsupported key or value: {0}")]
    UnsupportedKeyOrValue(String),
    /// JSON text could not be parsed or produced.
    #[error("JSON error: {0}")]
    Json(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for canonical container operations.
pub type Result<T> = std::result::Result<T, Error>;

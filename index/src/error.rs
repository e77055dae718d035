//! Error types for the approximate search index.

use thiserror::Error;

/// Result type alias for index operations.
pub type Result<T> = std::result::Result<T, IndexError>;

/// Errors that can occur while building or querying an index.
#[derive(Error, Debug)]
pub enum IndexError {
    /// No vectors were given to train on.
    #[error("cannot train an index on zero vectors")]
    Empty,

    /// Index size of zero was requested.
    #[error("index size must be positive")]
    InvalidSize,

    /// Unknown quantizer specification.
    #[error("unsupported index quantizer: {0} (expected Flat or SQ8)")]
    UnknownQuantizer(String),

    /// Dimension mismatch.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

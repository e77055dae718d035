//! Error types for the embeddings engine.

use std::path::PathBuf;

use ftext_index::IndexError;
use thiserror::Error;

/// Result type alias for embedding operations.
pub type Result<T> = std::result::Result<T, EmbeddingError>;

/// Errors that can occur in the embeddings engine.
#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// Training or quantization configuration is invalid.
    #[error(transparent)]
    Args(#[from] ArgsError),

    /// File could not be opened or created.
    #[error("cannot open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    /// File is not a model this engine can read.
    #[error("{} is not a valid model: {reason}", path.display())]
    InvalidModel { path: PathBuf, reason: String },

    /// Nothing survived the min-count threshold.
    #[error("empty vocabulary, try a smaller -minCount value")]
    EmptyVocabulary,

    /// Supervised training data without a single label.
    #[error("no labels found in the training data (labels start with {prefix:?})")]
    NoLabels { prefix: String },

    /// Operation not available for this kind of model.
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// Approximate search requested on a model without an index.
    #[error("model has no approximate search index")]
    MissingIndex,

    /// Index backend error.
    #[error("index error: {0}")]
    Index(#[from] IndexError),

    /// Model (de)serialization error.
    #[error("encoding error: {0}")]
    Encoding(#[from] bincode::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors produced while parsing training arguments.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ArgsError {
    /// Flag not recognized.
    #[error("unknown argument: {0}")]
    UnknownFlag(String),

    /// Token does not start with a dash.
    #[error("expected a flag, got {0:?}")]
    NotAFlag(String),

    /// Flag given without its value.
    #[error("missing value for {0}")]
    MissingValue(String),

    /// Value could not be parsed.
    #[error("invalid value {value:?} for {flag}")]
    InvalidValue { flag: String, value: String },

    /// Required flag absent.
    #[error("{0} is required")]
    MissingRequired(&'static str),
}

//! Typed outcomes of a command invocation.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use ftext_embeddings::EmbeddingError;
use thiserror::Error;

/// Result type alias for command handlers.
pub type Result<T> = std::result::Result<T, CliError>;

/// How a command that did not fail ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The command did its work.
    Success,

    /// `train-index` found an index already present and did nothing.
    AlreadyIndexed,
}

impl Outcome {
    /// Process exit status for this outcome.
    pub fn exit_code(self) -> ExitCode {
        ExitCode::SUCCESS
    }
}

/// Errors that end a command with a failure status.
#[derive(Error, Debug)]
pub enum CliError {
    /// Wrong argument shape.
    #[error("{message}")]
    Usage { message: String, usage: String },

    /// A file or stream could not be opened.
    #[error("{what} cannot be opened: {}: {source}", path.display())]
    Resource {
        what: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },

    /// The model is in the wrong state for the operation.
    #[error("{message}")]
    Precondition { message: String, usage: String },

    /// Engine failure.
    #[error(transparent)]
    Model(#[from] EmbeddingError),

    /// Writing results failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Usage text to print after the diagnostic, if any.
    pub fn usage(&self) -> Option<&str> {
        match self {
            Self::Usage { usage, .. } | Self::Precondition { usage, .. } => Some(usage),
            _ => None,
        }
    }

    /// Process exit status for this error.
    pub fn exit_code(&self) -> ExitCode {
        ExitCode::FAILURE
    }

    /// Print the diagnostic and any usage text.
    pub fn report(&self, err: &mut dyn Write) -> std::io::Result<()> {
        writeln!(err, "{self}")?;
        if let Some(usage) = self.usage() {
            writeln!(err)?;
            writeln!(err, "{}", usage.trim_end())?;
        }
        Ok(())
    }
}

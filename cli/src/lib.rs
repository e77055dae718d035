//! # ftext command line
//!
//! Maps each subcommand onto the model lifecycle:
//!
//! ```text
//! argv ──► Cli (clap) ──► router ──► streams ──► ModelLifecycle ──► handler
//!                                       │              │               │
//!                                       ▼              ▼               ▼
//!                                 files / stdin   load / save    search / export
//! ```
//!
//! Handlers return an [`Outcome`] or a [`CliError`]; only `main` turns them
//! into a process exit status.

pub mod command;
pub mod error;
pub mod export;
pub mod lifecycle;
pub mod model;
pub mod router;
pub mod search;
pub mod streams;

#[cfg(test)]
mod test_support;

pub use command::{Cli, Command};
pub use error::{CliError, Outcome, Result};
pub use lifecycle::ModelLifecycle;
pub use model::EmbeddingModel;
pub use router::{run, run_with};
pub use search::IndexState;
pub use streams::Streams;

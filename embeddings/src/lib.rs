//! # Embeddings
//!
//! Word representation learning and text classification in the style of
//! fastText.
//!
//! ## Features
//!
//! - **Training**: supervised classifiers, skipgram and cbow word vectors
//! - **Sub-words**: hashed character and word n-grams for unseen words
//! - **Quantization**: 8-bit compression of trained models
//! - **Approximate search**: optional inverted-file index over label vectors
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        FastText                                 │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  Args ──► Dictionary ──► input Matrix ──► hidden ──► output     │
//! │              │               │                         │        │
//! │              ▼               ▼                         ▼        │
//! │       sub-word rows     QuantMatrix               IvfIndex      │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod args;
pub mod dictionary;
pub mod error;
pub mod fasttext;
pub mod matrix;
pub mod meter;
mod model;
pub mod quantize;
pub mod similarity;
pub mod text;

pub use args::{Args, LossName, ModelName};
pub use dictionary::Dictionary;
pub use error::{ArgsError, EmbeddingError, Result};
pub use fasttext::{FastText, FvecsRecord, write_vector};
pub use meter::Meter;
pub use similarity::Prediction;
pub use text::lossy_lines;

pub use ftext_index::IndexQuantizer;

/// A dense vector embedding.
pub type Embedding = Vec<f32>;

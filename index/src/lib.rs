//! # Index
//!
//! Approximate nearest-neighbour search over the output vectors of an
//! ftext model.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Inverted File Index                          │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  k-means centroids ──► inverted lists ──► stored vectors        │
//! │         │                                   │                   │
//! │         ▼                                   ▼                   │
//! │   nprobe partitions                  Flat / SQ8 codecs          │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod ivf;
mod kmeans;
pub mod quantizer;

pub use error::{IndexError, Result};
pub use ivf::{IvfIndex, Neighbor};
pub use quantizer::IndexQuantizer;

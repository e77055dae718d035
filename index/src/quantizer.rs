//! Stored-vector codecs for inverted lists.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::IndexError;

/// How vectors are stored inside the inverted lists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexQuantizer {
    /// Exact `f32` vectors, exhaustive scoring within probed lists.
    #[default]
    Flat,
    /// One byte per component with a per-vector min and scale.
    Sq8,
}

impl FromStr for IndexQuantizer {
    type Err = IndexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let spec = s.trim();
        if spec.eq_ignore_ascii_case("flat") {
            Ok(Self::Flat)
        } else if spec.eq_ignore_ascii_case("sq8") {
            Ok(Self::Sq8)
        } else {
            Err(IndexError::UnknownQuantizer(spec.to_string()))
        }
    }
}

impl fmt::Display for IndexQuantizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flat => f.write_str("Flat"),
            Self::Sq8 => f.write_str("SQ8"),
        }
    }
}

/// Vectors of one inverted list, laid out contiguously.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) enum StoredVectors {
    Flat {
        data: Vec<f32>,
    },
    Sq8 {
        codes: Vec<u8>,
        mins: Vec<f32>,
        scales: Vec<f32>,
    },
}

impl StoredVectors {
    pub(crate) fn new(quantizer: IndexQuantizer) -> Self {
        match quantizer {
            IndexQuantizer::Flat => Self::Flat { data: Vec::new() },
            IndexQuantizer::Sq8 => Self::Sq8 {
                codes: Vec::new(),
                mins: Vec::new(),
                scales: Vec::new(),
            },
        }
    }

    pub(crate) fn push(&mut self, vector: &[f32]) {
        match self {
            Self::Flat { data } => data.extend_from_slice(vector),
            Self::Sq8 {
                codes,
                mins,
                scales,
            } => {
                let min = vector.iter().copied().fold(f32::INFINITY, f32::min);
                let max = vector.iter().copied().fold(f32::NEG_INFINITY, f32::max);
                let scale = if max > min { (max - min) / 255.0 } else { 0.0 };
                codes.extend(vector.iter().map(|&x| {
                    if scale > 0.0 {
                        ((x - min) / scale).round().clamp(0.0, 255.0) as u8
                    } else {
                        0
                    }
                }));
                mins.push(min);
                scales.push(scale);
            }
        }
    }

    /// Inner product between `query` and the `slot`-th stored vector.
    pub(crate) fn inner_product(&self, slot: usize, query: &[f32]) -> f32 {
        let dim = query.len();
        let start = slot * dim;
        match self {
            Self::Flat { data } => data[start..start + dim]
                .iter()
                .zip(query)
                .map(|(x, q)| x * q)
                .sum(),
            Self::Sq8 {
                codes,
                mins,
                scales,
            } => {
                let (min, scale) = (mins[slot], scales[slot]);
                codes[start..start + dim]
                    .iter()
                    .zip(query)
                    .map(|(&c, q)| (min + f32::from(c) * scale) * q)
                    .sum()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_quantizer_spec() {
        assert_eq!("Flat".parse::<IndexQuantizer>().unwrap(), IndexQuantizer::Flat);
        assert_eq!("sq8".parse::<IndexQuantizer>().unwrap(), IndexQuantizer::Sq8);
        assert!("PQ16".parse::<IndexQuantizer>().is_err());
        assert_eq!(IndexQuantizer::Sq8.to_string(), "SQ8");
    }

    #[test]
    fn test_sq8_inner_product_is_close() {
        let mut stored = StoredVectors::new(IndexQuantizer::Sq8);
        stored.push(&[0.5, -1.0, 2.0]);
        let query = [1.0, 1.0, 1.0];
        let approx = stored.inner_product(0, &query);
        assert!((approx - 1.5).abs() < 0.02, "got {approx}");
    }

    #[test]
    fn test_sq8_constant_vector() {
        let mut stored = StoredVectors::new(IndexQuantizer::Sq8);
        stored.push(&[0.25, 0.25]);
        assert!((stored.inner_product(0, &[2.0, 2.0]) - 1.0).abs() < 1e-6);
    }
}

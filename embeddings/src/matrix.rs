//! Row-major parameter matrices.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::quantize::QuantMatrix;
use crate::similarity::{add_scaled, dot_product};

/// Dense row-major `f32` matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

impl DenseMatrix {
    /// Create a zero matrix.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Create a matrix with entries drawn uniformly from `[-bound, bound)`.
    pub fn uniform(rows: usize, cols: usize, bound: f32, rng: &mut impl Rng) -> Self {
        let data = (0..rows * cols)
            .map(|_| rng.random_range(-bound..bound))
            .collect();
        Self { rows, cols, data }
    }

    /// Build a matrix from explicit rows, all of length `cols`.
    pub fn from_rows(cols: usize, rows: impl IntoIterator<Item = Vec<f32>>) -> Self {
        let mut data = Vec::new();
        let mut count = 0;
        for row in rows {
            debug_assert_eq!(row.len(), cols);
            data.extend(row);
            count += 1;
        }
        Self {
            rows: count,
            cols,
            data,
        }
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Borrow row `i`.
    pub fn row(&self, i: usize) -> &[f32] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    /// Mutably borrow row `i`.
    pub fn row_mut(&mut self, i: usize) -> &mut [f32] {
        &mut self.data[i * self.cols..(i + 1) * self.cols]
    }

    /// `row_i += scale * v`.
    pub fn add_to_row(&mut self, i: usize, v: &[f32], scale: f32) {
        add_scaled(self.row_mut(i), v, scale);
    }
}

/// Parameter matrix that may have been compressed by `quantize`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Matrix {
    /// Trainable `f32` storage.
    Dense(DenseMatrix),
    /// Read-only 8-bit storage.
    Quantized(QuantMatrix),
}

impl Matrix {
    /// Number of rows.
    pub fn rows(&self) -> usize {
        match self {
            Self::Dense(m) => m.rows(),
            Self::Quantized(m) => m.rows(),
        }
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        match self {
            Self::Dense(m) => m.cols(),
            Self::Quantized(m) => m.cols(),
        }
    }

    /// Whether the matrix is stored quantized.
    pub fn is_quantized(&self) -> bool {
        matches!(self, Self::Quantized(_))
    }

    /// `out += scale * row_i`.
    pub fn add_row_to(&self, out: &mut [f32], i: usize, scale: f32) {
        match self {
            Self::Dense(m) => add_scaled(out, m.row(i), scale),
            Self::Quantized(m) => m.add_row_to(out, i, scale),
        }
    }

    /// Dot product of `v` with row `i`.
    pub fn dot_row(&self, v: &[f32], i: usize) -> f32 {
        match self {
            Self::Dense(m) => dot_product(m.row(i), v),
            Self::Quantized(m) => m.dot_row(v, i),
        }
    }

    /// Copy of row `i`, decoded if quantized.
    pub fn row_vec(&self, i: usize) -> Vec<f32> {
        match self {
            Self::Dense(m) => m.row(i).to_vec(),
            Self::Quantized(m) => m.decode_row(i),
        }
    }
}

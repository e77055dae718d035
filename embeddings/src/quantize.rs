//! Lossy compression of trained parameter matrices.
//!
//! Each row is stored as one byte per component plus a per-row minimum and
//! step. With `qnorm` the row is normalized first and its norm kept as an
//! exact `f32`, which preserves vector lengths for prediction.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::matrix::DenseMatrix;
use crate::similarity::norm;

/// 8-bit scalar-quantized matrix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuantMatrix {
    rows: usize,
    cols: usize,
    codes: Vec<u8>,
    mins: Vec<f32>,
    steps: Vec<f32>,
    norms: Option<Vec<f32>>,
}

impl QuantMatrix {
    /// Quantize every row of `matrix`.
    pub fn from_dense(matrix: &DenseMatrix, qnorm: bool) -> Self {
        let (rows, cols) = (matrix.rows(), matrix.cols());
        let mut codes = Vec::with_capacity(rows * cols);
        let mut mins = Vec::with_capacity(rows);
        let mut steps = Vec::with_capacity(rows);
        let mut norms = qnorm.then(|| Vec::with_capacity(rows));

        for i in 0..rows {
            let mut row = matrix.row(i).to_vec();
            if let Some(norms) = norms.as_mut() {
                let n = norm(&row);
                norms.push(n);
                if n > 0.0 {
                    row.iter_mut().for_each(|x| *x /= n);
                }
            }

            let min = row.iter().copied().fold(f32::INFINITY, f32::min);
            let max = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);
            let step = if max > min { (max - min) / 255.0 } else { 0.0 };
            codes.extend(row.iter().map(|&x| {
                if step > 0.0 {
                    ((x - min) / step).round().clamp(0.0, 255.0) as u8
                } else {
                    0
                }
            }));
            mins.push(if min.is_finite() { min } else { 0.0 });
            steps.push(step);
        }

        debug!("Quantized {rows}x{cols} matrix (qnorm: {qnorm})");
        Self {
            rows,
            cols,
            codes,
            mins,
            steps,
            norms,
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

    fn codes(&self, i: usize) -> &[u8] {
        &self.codes[i * self.cols..(i + 1) * self.cols]
    }

    fn row_norm(&self, i: usize) -> f32 {
        self.norms.as_ref().map_or(1.0, |n| n[i])
    }

    /// `out += scale * row_i`.
    pub fn add_row_to(&self, out: &mut [f32], i: usize, scale: f32) {
        let (min, step) = (self.mins[i], self.steps[i]);
        let factor = scale * self.row_norm(i);
        for (o, &c) in out.iter_mut().zip(self.codes(i)) {
            *o += factor * (min + f32::from(c) * step);
        }
    }

    /// Dot product of `v` with row `i`.
    pub fn dot_row(&self, v: &[f32], i: usize) -> f32 {
        let (min, step) = (self.mins[i], self.steps[i]);
        let dot: f32 = v
            .iter()
            .zip(self.codes(i))
            .map(|(x, &c)| x * (min + f32::from(c) * step))
            .sum();
        dot * self.row_norm(i)
    }

    /// Decode row `i`.
    pub fn decode_row(&self, i: usize) -> Vec<f32> {
        let mut out = vec![0.0; self.cols];
        self.add_row_to(&mut out, i, 1.0);
        out
    }
}

/// Pick the `cutoff` word rows with the largest norms.
///
/// `always_keep` (the end-of-sentence word) survives regardless of its norm.
/// The returned ids are sorted so the dictionary keeps its frequency order.
pub fn select_by_norm(
    input: &DenseMatrix,
    nwords: usize,
    cutoff: usize,
    always_keep: Option<usize>,
) -> Vec<usize> {
    let mut ids: Vec<usize> = (0..nwords).collect();
    ids.sort_by_key(|&i| std::cmp::Reverse(OrderedFloat(norm(input.row(i)))));
    ids.truncate(cutoff);

    if let Some(eos) = always_keep.filter(|&e| e < nwords) {
        if !ids.contains(&eos) {
            ids.pop();
            ids.push(eos);
        }
    }
    ids.sort_unstable();
    ids
}

//! Vector arithmetic and top-k selection.

use ordered_float::OrderedFloat;

use crate::Embedding;

/// A scored label or word.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Label or word.
    pub label: String,

    /// Probability, cosine similarity or raw score depending on the query.
    pub score: f32,
}

impl Prediction {
    /// Create a new prediction.
    pub fn new(label: impl Into<String>, score: f32) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

/// Dot product of two equally sized slices.
pub fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Euclidean norm.
pub fn norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Normalize an embedding to unit length.
pub fn normalize(embedding: &mut Embedding) {
    let magnitude = norm(embedding);
    if magnitude > 0.0 {
        for x in embedding.iter_mut() {
            *x /= magnitude;
        }
    }
}

/// `a += scale * b`.
pub fn add_scaled(a: &mut [f32], b: &[f32], scale: f32) {
    for (x, y) in a.iter_mut().zip(b) {
        *x += scale * y;
    }
}

/// Keep the `k` highest `(score, id)` pairs, best first; ties keep the lower id first.
pub fn top_k(scores: impl IntoIterator<Item = (f32, usize)>, k: usize) -> Vec<(f32, usize)> {
    let mut scores: Vec<(OrderedFloat<f32>, usize)> = scores
        .into_iter()
        .filter(|(s, _)| !s.is_nan())
        .map(|(s, id)| (OrderedFloat(s), id))
        .collect();

    // Sort by score descending
    scores.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));

    scores
        .into_iter()
        .take(k)
        .map(|(score, id)| (score.0, id))
        .collect()
}

/// Numerically stable in-place softmax.
pub fn softmax(scores: &mut [f32]) {
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mut z = 0.0;
    for s in scores.iter_mut() {
        *s = (*s - max).exp();
        z += *s;
    }
    if z > 0.0 {
        for s in scores.iter_mut() {
            *s /= z;
        }
    }
}

/// Logistic function.
pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

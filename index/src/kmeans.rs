//! Coarse quantizer training.

use rand::rngs::StdRng;
use rand::seq::index::sample;
use tracing::debug;

pub(crate) const ITERATIONS: usize = 20;

pub(crate) fn inner_product(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Index of the centroid with the largest inner product.
pub(crate) fn nearest(centroids: &[Vec<f32>], vector: &[f32]) -> usize {
    let mut best = 0;
    let mut best_score = f32::NEG_INFINITY;
    for (i, centroid) in centroids.iter().enumerate() {
        let score = inner_product(centroid, vector);
        if score > best_score {
            best = i;
            best_score = score;
        }
    }
    best
}

/// Lloyd iterations with inner-product assignment.
///
/// `k` must not exceed `vectors.len()`. Clusters that lose all members keep
/// their previous centroid.
pub(crate) fn train(vectors: &[&[f32]], k: usize, rng: &mut StdRng) -> Vec<Vec<f32>> {
    let dim = vectors.first().map_or(0, |v| v.len());
    let mut centroids: Vec<Vec<f32>> = sample(rng, vectors.len(), k)
        .into_iter()
        .map(|i| vectors[i].to_vec())
        .collect();

    let mut assignment = vec![usize::MAX; vectors.len()];
    for iteration in 0..ITERATIONS {
        let mut changed = 0usize;
        for (slot, vector) in vectors.iter().enumerate() {
            let c = nearest(&centroids, vector);
            if assignment[slot] != c {
                assignment[slot] = c;
                changed += 1;
            }
        }

        let mut sums = vec![vec![0.0f32; dim]; k];
        let mut counts = vec![0usize; k];
        for (vector, &c) in vectors.iter().zip(&assignment) {
            counts[c] += 1;
            for (s, x) in sums[c].iter_mut().zip(vector.iter()) {
                *s += x;
            }
        }
        for ((centroid, sum), count) in centroids.iter_mut().zip(sums).zip(counts) {
            if count > 0 {
                let n = count as f32;
                *centroid = sum.into_iter().map(|s| s / n).collect();
            }
        }

        debug!("k-means iteration {iteration}: {changed} reassignments");
        if changed == 0 {
            break;
        }
    }

    centroids
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;

    #[test]
    fn test_nearest_uses_inner_product() {
        let centroids = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        assert_eq!(nearest(&centroids, &[0.2, 0.9]), 1);
        assert_eq!(nearest(&centroids, &[3.0, -1.0]), 0);
    }

    #[test]
    fn test_train_separates_two_groups() {
        let data = [
            vec![1.0, 0.0],
            vec![0.9, 0.1],
            vec![0.0, 1.0],
            vec![0.1, 0.9],
        ];
        let vectors: Vec<&[f32]> = data.iter().map(Vec::as_slice).collect();
        let mut rng = StdRng::seed_from_u64(7);
        let centroids = train(&vectors, 2, &mut rng);

        assert_eq!(centroids.len(), 2);
        assert_eq!(nearest(&centroids, &data[0]), nearest(&centroids, &data[1]));
        assert_eq!(nearest(&centroids, &data[2]), nearest(&centroids, &data[3]));
        assert!(nearest(&centroids, &data[0]) != nearest(&centroids, &data[2]));
    }
}

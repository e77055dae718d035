//! Inverted-file index over a fixed set of vectors.

use ordered_float::OrderedFloat;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{IndexError, Result};
use crate::kmeans;
use crate::quantizer::{IndexQuantizer, StoredVectors};

/// A search hit: the id of a stored vector and its inner product with the query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Row id the vector was trained with.
    pub id: u32,

    /// Inner product score.
    pub score: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct InvertedList {
    ids: Vec<u32>,
    vectors: StoredVectors,
}

/// An inverted-file index for maximum inner product search.
///
/// Vectors are partitioned by a k-means coarse quantizer. A query scores the
/// centroids, visits the `nprobe` best partitions and scores every vector
/// stored there.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IvfIndex {
    /// Dimension of indexed vectors.
    dimension: usize,

    /// Stored-vector codec.
    quantizer: IndexQuantizer,

    /// One centroid per inverted list.
    centroids: Vec<Vec<f32>>,

    /// Inverted lists, parallel to `centroids`.
    lists: Vec<InvertedList>,
}

impl IvfIndex {
    /// Train an index over `vectors`, where the position of each vector is its id.
    ///
    /// `size` is the requested number of partitions; it is clamped to the
    /// number of vectors.
    pub fn train(
        vectors: &[&[f32]],
        size: usize,
        quantizer: IndexQuantizer,
        seed: u64,
    ) -> Result<Self> {
        if size == 0 {
            return Err(IndexError::InvalidSize);
        }
        let dimension = vectors.first().map(|v| v.len()).ok_or(IndexError::Empty)?;
        if let Some(bad) = vectors.iter().find(|v| v.len() != dimension) {
            return Err(IndexError::DimensionMismatch {
                expected: dimension,
                actual: bad.len(),
            });
        }

        let nlist = size.min(vectors.len());
        if nlist < size {
            warn!(
                "index size {size} exceeds the {} available vectors, using {nlist} partitions",
                vectors.len()
            );
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let centroids = kmeans::train(vectors, nlist, &mut rng);

        let mut lists: Vec<InvertedList> = (0..nlist)
            .map(|_| InvertedList {
                ids: Vec::new(),
                vectors: StoredVectors::new(quantizer),
            })
            .collect();
        for (id, vector) in vectors.iter().enumerate() {
            let list = &mut lists[kmeans::nearest(&centroids, vector)];
            list.ids.push(id as u32);
            list.vectors.push(vector);
        }

        info!(
            "Trained {quantizer} IVF index: {} vectors, {nlist} partitions, dimension {dimension}",
            vectors.len()
        );

        Ok(Self {
            dimension,
            quantizer,
            centroids,
            lists,
        })
    }

    /// Stored-vector codec.
    pub fn quantizer(&self) -> IndexQuantizer {
        self.quantizer
    }

    /// Number of partitions.
    pub fn nlist(&self) -> usize {
        self.centroids.len()
    }

    /// Number of indexed vectors.
    pub fn len(&self) -> usize {
        self.lists.iter().map(|l| l.ids.len()).sum()
    }

    /// Check if the index holds no vectors.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return the `k` best vectors by inner product, probing `nprobe` partitions.
    pub fn search(&self, query: &[f32], k: usize, nprobe: usize) -> Result<Vec<Neighbor>> {
        if query.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut partitions: Vec<(OrderedFloat<f32>, usize)> = self
            .centroids
            .iter()
            .enumerate()
            .map(|(i, c)| (OrderedFloat(kmeans::inner_product(c, query)), i))
            .collect();
        partitions.sort_by(|a, b| b.0.cmp(&a.0));
        partitions.truncate(nprobe.max(1));

        let mut hits: Vec<(OrderedFloat<f32>, u32)> = Vec::new();
        for (_, p) in &partitions {
            let list = &self.lists[*p];
            for (slot, &id) in list.ids.iter().enumerate() {
                hits.push((OrderedFloat(list.vectors.inner_product(slot, query)), id));
            }
        }
        debug!(
            "Scored {} vectors in {} partitions",
            hits.len(),
            partitions.len()
        );

        // Sort by score descending, ties by id
        hits.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));

        Ok(hits
            .into_iter()
            .take(k)
            .map(|(score, id)| Neighbor { id, score: score.0 })
            .collect())
    }
}

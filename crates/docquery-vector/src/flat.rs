//! Brute-force flat index.
//!
//! Vectors are stored contiguously in insertion order. Every search scans all
//! of them, which keeps results exact and ordering deterministic.

use docquery_embeddings::Embedding;
use tracing::{debug, info};

use crate::error::VectorError;
use crate::index::{IndexStats, SearchResult, VectorIndex};

/// Exact squared-L2 index over a fixed set of vectors.
#[derive(Debug, Clone)]
pub struct FlatIndex {
    dimension: usize,
    data: Vec<f32>,
    count: usize,
    model: Option<String>,
}

impl FlatIndex {
    /// Build an index from `vectors`, stored in the given order.
    ///
    /// All vectors must share one dimension. An empty input yields an empty
    /// index whose searches fail with [`VectorError::EmptyIndex`].
    pub fn build(vectors: Vec<Embedding>) -> Result<Self, VectorError> {
        let dimension = vectors.first().map(Embedding::dimension).unwrap_or(0);

        let mut data = Vec::with_capacity(dimension * vectors.len());
        for vector in &vectors {
            if vector.dimension() != dimension {
                return Err(VectorError::DimensionMismatch {
                    expected: dimension,
                    actual: vector.dimension(),
                });
            }
            data.extend_from_slice(&vector.values);
        }

        if dimension == 0 && !vectors.is_empty() {
            return Err(VectorError::InvalidArgument(
                "vectors must have at least one component".to_string(),
            ));
        }

        info!(vectors = vectors.len(), dimension, "Built flat index");
        Ok(Self {
            dimension,
            data,
            count: vectors.len(),
            model: None,
        })
    }

    /// Record the embedding model the vectors came from.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    /// Stored vector at `position`.
    pub fn vector(&self, position: usize) -> Option<&[f32]> {
        if position >= self.count {
            return None;
        }
        let start = position * self.dimension;
        self.data.get(start..start + self.dimension)
    }

    fn rows(&self) -> impl Iterator<Item = &[f32]> {
        // chunks_exact panics on 0; an empty index has no rows either way
        self.data.chunks_exact(self.dimension.max(1))
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

impl VectorIndex for FlatIndex {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn len(&self) -> usize {
        self.count
    }

    fn search(&self, query: &Embedding, k: usize) -> Result<Vec<SearchResult>, VectorError> {
        if k == 0 {
            return Err(VectorError::InvalidArgument("k must be at least 1".to_string()));
        }
        if self.count == 0 {
            return Err(VectorError::EmptyIndex);
        }
        if query.dimension() != self.dimension {
            return Err(VectorError::DimensionMismatch {
                expected: self.dimension,
                actual: query.dimension(),
            });
        }

        let mut results: Vec<SearchResult> = self
            .rows()
            .enumerate()
            .map(|(position, row)| SearchResult::new(position, squared_l2(&query.values, row)))
            .collect();

        results.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then(a.position.cmp(&b.position))
        });
        results.truncate(k.min(self.count));

        debug!(k, found = results.len(), "Search complete");
        Ok(results)
    }

    fn stats(&self) -> IndexStats {
        IndexStats {
            vector_count: self.count,
            dimension: self.dimension,
            size_bytes: (self.data.len() * std::mem::size_of::<f32>()) as u64,
            model: self.model.clone(),
        }
    }
}

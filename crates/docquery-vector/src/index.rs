//! Nearest-neighbor search interface shared by index implementations.

use docquery_embeddings::Embedding;

use crate::error::VectorError;

/// One hit: where the vector sits and how far it is from the query.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    /// Insertion position; maps back to the chunk at the same index
    pub position: usize,
    /// Squared L2 distance (lower = more similar)
    pub distance: f32,
}

impl SearchResult {
    pub fn new(position: usize, distance: f32) -> Self {
        Self { position, distance }
    }
}

/// Size summary for logging and the CLI.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexStats {
    pub vector_count: usize,
    pub dimension: usize,
    /// Approximate memory held by vector data
    pub size_bytes: u64,
    /// Embedding model the vectors came from, if recorded
    pub model: Option<String>,
}

/// Read-only k-NN index over fixed-dimension embeddings.
///
/// Indexes are read-only once built, so implementations can be shared across
/// threads without locking.
pub trait VectorIndex: Send + Sync {
    /// Length every stored and query vector must have
    fn dimension(&self) -> usize;

    /// Stored vector count
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The `k` closest stored vectors to `query`.
    ///
    /// Returns `min(k, len)` results sorted by ascending distance, ties
    /// broken by lower position.
    fn search(&self, query: &Embedding, k: usize) -> Result<Vec<SearchResult>, VectorError>;

    fn stats(&self) -> IndexStats;
}

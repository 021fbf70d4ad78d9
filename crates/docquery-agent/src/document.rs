//! An indexed document: chunks, their vectors, and the model that made them.

use std::path::{Path, PathBuf};

use docquery_embeddings::{Embedding, ModelInfo};
use docquery_types::TextChunk;
use docquery_vector::{FlatIndex, SearchResult, VectorError, VectorIndex};

/// Chunks paired position-for-position with a vector index.
///
/// Immutable once built; share it behind an `Arc`.
#[derive(Debug)]
pub struct DocumentIndex {
    chunks: Vec<TextChunk>,
    index: FlatIndex,
    model: ModelInfo,
    source: Option<PathBuf>,
}

impl DocumentIndex {
    /// Index `chunks` with their `embeddings` (same length, same order).
    pub fn build(
        chunks: Vec<TextChunk>,
        embeddings: Vec<Embedding>,
        model: ModelInfo,
    ) -> Result<Self, VectorError> {
        if chunks.len() != embeddings.len() {
            return Err(VectorError::InvalidArgument(format!(
                "{} chunks but {} embeddings",
                chunks.len(),
                embeddings.len()
            )));
        }

        let index = FlatIndex::build(embeddings)?.with_model(model.name.clone());
        Ok(Self {
            chunks,
            index,
            model,
            source: None,
        })
    }

    /// Record the file the text was extracted from.
    pub fn with_source(mut self, path: impl Into<PathBuf>) -> Self {
        self.source = Some(path.into());
        self
    }

    pub fn chunks(&self) -> &[TextChunk] {
        &self.chunks
    }

    pub fn chunk(&self, position: usize) -> Option<&TextChunk> {
        self.chunks.get(position)
    }

    pub fn index(&self) -> &FlatIndex {
        &self.index
    }

    /// Embedding model the index was built with.
    pub fn model(&self) -> &ModelInfo {
        &self.model
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Nearest chunks to `query`, best first.
    pub fn search(
        &self,
        query: &Embedding,
        k: usize,
    ) -> Result<Vec<(SearchResult, &TextChunk)>, VectorError> {
        let results = self.index.search(query, k)?;
        Ok(results
            .into_iter()
            .filter_map(|r| self.chunks.get(r.position).map(|c| (r, c)))
            .collect())
    }
}

//! Chunk retrieval for the search tool.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use docquery_embeddings::{EmbeddingClient, EmbeddingError};

use crate::document::DocumentIndex;
use crate::error::AgentError;

/// A chunk returned by a search.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedChunk {
    /// Chunk sequence index in the document
    pub position: usize,
    /// Squared L2 distance to the query
    pub distance: f32,
    pub content: String,
}

/// Finds the chunks most relevant to a query.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Up to `top_k` chunks, best first.
    async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<RetrievedChunk>, AgentError>;
}

/// Embeds the query and searches a [`DocumentIndex`].
pub struct IndexRetriever {
    embedder: EmbeddingClient,
    document: Arc<DocumentIndex>,
}

impl IndexRetriever {
    /// Pair an embedder with a document index.
    ///
    /// The embedder must be the model the index was built with; vectors from
    /// different models are not comparable.
    pub fn new(embedder: EmbeddingClient, document: Arc<DocumentIndex>) -> Result<Self, EmbeddingError> {
        let expected = &document.model().name;
        let actual = &embedder.info().name;
        if expected != actual {
            return Err(EmbeddingError::ModelMismatch {
                expected: expected.clone(),
                actual: actual.clone(),
            });
        }
        Ok(Self { embedder, document })
    }

    pub fn document(&self) -> &Arc<DocumentIndex> {
        &self.document
    }
}

#[async_trait]
impl Retriever for IndexRetriever {
    async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<RetrievedChunk>, AgentError> {
        let query_vector = self.embedder.embed_query(query).await?;
        let hits = self.document.search(&query_vector, top_k)?;

        debug!(query, top_k, found = hits.len(), "Retrieved chunks");
        Ok(hits
            .into_iter()
            .map(|(result, chunk)| RetrievedChunk {
                position: result.position,
                distance: result.distance,
                content: chunk.content().to_string(),
            })
            .collect())
    }
}

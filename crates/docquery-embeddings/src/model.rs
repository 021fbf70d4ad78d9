//! Embedding providers and the vectors they return.

use async_trait::async_trait;

use crate::error::EmbeddingError;

/// Vector embedding as returned by the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    pub values: Vec<f32>,
}

impl Embedding {
    /// Wrap raw provider output.
    pub fn new(values: Vec<f32>) -> Self {
        Self { values }
    }

    /// Copy scaled to unit length. Zero vectors are returned unchanged.
    pub fn normalized(&self) -> Self {
        let norm: f32 = self.values.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            Self::new(self.values.iter().map(|x| x / norm).collect())
        } else {
            self.clone()
        }
    }

    /// Get the embedding dimension
    pub fn dimension(&self) -> usize {
        self.values.len()
    }

    /// Squared Euclidean distance. Both embeddings must share a dimension.
    pub fn squared_l2(&self, other: &Embedding) -> f32 {
        self.values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum()
    }
}

impl From<Vec<f32>> for Embedding {
    fn from(values: Vec<f32>) -> Self {
        Self::new(values)
    }
}

/// Model information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelInfo {
    /// Model identifier (e.g., "text-embedding-3-large")
    pub name: String,
    /// Embedding dimension, when known ahead of the first request
    pub dimension: Option<usize>,
}

/// Trait for embedding providers.
///
/// Shared across tasks behind `Arc<dyn EmbeddingModel>`.
/// A failed call is an error, never an empty success.
#[async_trait]
pub trait EmbeddingModel: Send + Sync {
    /// Get model information
    fn info(&self) -> &ModelInfo;

    /// Generate one embedding per text, in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>, EmbeddingError>;

    /// Generate embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        let mut embeddings = self.embed_batch(&[text.to_string()]).await?;
        embeddings
            .pop()
            .ok_or_else(|| EmbeddingError::InvalidInput("provider returned no vector".to_string()))
    }
}

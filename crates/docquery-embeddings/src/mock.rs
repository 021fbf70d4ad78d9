//! Mock embedder for testing and offline runs.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use docquery_types::ProviderError;

use crate::error::EmbeddingError;
use crate::model::{Embedding, EmbeddingModel, ModelInfo};

/// Deterministic hashed bag-of-words embedder.
///
/// Each lowercase alphanumeric token is hashed into one of `dimension`
/// buckets and the counts are normalized to unit length, so texts sharing
/// words land close together. No network access.
pub struct MockEmbedder {
    info: ModelInfo,
    failure: Option<ProviderError>,
    calls: AtomicUsize,
}

impl MockEmbedder {
    /// Create a mock embedder producing vectors of `dimension`.
    pub fn new(dimension: usize) -> Self {
        Self {
            info: ModelInfo {
                name: format!("mock-{dimension}"),
                dimension: Some(dimension),
            },
            failure: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Make every call fail with `error`.
    pub fn with_failure(mut self, error: ProviderError) -> Self {
        self.failure = Some(error);
        self
    }

    /// Override the reported model name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.info.name = name.into();
        self
    }

    /// Number of `embed_batch` calls received.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn vectorize(&self, text: &str) -> Embedding {
        let dimension = self.info.dimension.unwrap_or(1).max(1);
        let mut values = vec![0.0f32; dimension];

        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let bucket = (fnv1a(&token.to_lowercase()) % dimension as u64) as usize;
            values[bucket] += 1.0;
        }

        Embedding::new(values).normalized()
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new(64)
    }
}

#[async_trait]
impl EmbeddingModel for MockEmbedder {
    fn info(&self) -> &ModelInfo {
        &self.info
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = &self.failure {
            return Err(EmbeddingError::Provider(error.clone()));
        }
        Ok(texts.iter().map(|t| self.vectorize(t)).collect())
    }
}

/// 64-bit FNV-1a; stable across runs and platforms.
fn fnv1a(text: &str) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    text.bytes()
        .fold(OFFSET, |hash, byte| (hash ^ byte as u64).wrapping_mul(PRIME))
}

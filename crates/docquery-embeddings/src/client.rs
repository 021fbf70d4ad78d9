//! Embedding client.
//!
//! Wraps an [`EmbeddingModel`] with the checks every caller needs: inputs are
//! size-validated before submission, and the provider's output must contain
//! exactly one vector per input, all of one dimension.

use std::sync::Arc;

use tracing::{debug, info};

use crate::error::EmbeddingError;
use crate::model::{Embedding, EmbeddingModel, ModelInfo};
use crate::validate::SizeValidator;

/// Validating front end for an embedding model.
#[derive(Clone)]
pub struct EmbeddingClient {
    model: Arc<dyn EmbeddingModel>,
    validator: Arc<SizeValidator>,
}

impl EmbeddingClient {
    pub fn new(model: Arc<dyn EmbeddingModel>, validator: SizeValidator) -> Self {
        Self {
            model,
            validator: Arc::new(validator),
        }
    }

    pub fn info(&self) -> &ModelInfo {
        self.model.info()
    }

    pub fn validator(&self) -> &SizeValidator {
        &self.validator
    }

    /// True when every input is within the size limit.
    pub fn validate<S: AsRef<str>>(&self, texts: &[S]) -> bool {
        self.validator.validate(texts)
    }

    /// Report every oversized input as [`EmbeddingError::ChunkTooLarge`].
    pub fn check_sizes<S: AsRef<str>>(&self, texts: &[S]) -> Result<(), EmbeddingError> {
        self.validator.check(texts)
    }

    /// Embed `texts`, one vector per input in input order.
    ///
    /// Fails with [`EmbeddingError::ChunkTooLarge`] without contacting the
    /// provider when any input is oversized.
    pub async fn embed(&self, texts: &[String]) -> Result<Vec<Embedding>, EmbeddingError> {
        if texts.is_empty() {
            return Err(EmbeddingError::InvalidInput("no texts to embed".to_string()));
        }
        if let Some(position) = texts.iter().position(|t| t.trim().is_empty()) {
            return Err(EmbeddingError::InvalidInput(format!(
                "text at position {position} is empty"
            )));
        }
        self.check_sizes(texts)?;

        debug!(model = %self.info().name, inputs = texts.len(), "Embedding texts");
        let embeddings = self.model.embed_batch(texts).await?;
        self.check_shape(texts.len(), &embeddings)?;

        info!(
            model = %self.info().name,
            vectors = embeddings.len(),
            dimension = embeddings.first().map(Embedding::dimension).unwrap_or(0),
            "Embeddings created"
        );
        Ok(embeddings)
    }

    /// Embed a single query string.
    pub async fn embed_query(&self, query: &str) -> Result<Embedding, EmbeddingError> {
        let mut embeddings = self.embed(&[query.to_string()]).await?;
        embeddings
            .pop()
            .ok_or_else(|| EmbeddingError::InvalidInput("provider returned no vector".to_string()))
    }

    fn check_shape(&self, inputs: usize, embeddings: &[Embedding]) -> Result<(), EmbeddingError> {
        if embeddings.len() != inputs {
            return Err(EmbeddingError::Provider(
                docquery_types::ProviderError::InvalidResponse(format!(
                    "expected {inputs} vectors, got {}",
                    embeddings.len()
                )),
            ));
        }

        let expected = self
            .info()
            .dimension
            .or_else(|| embeddings.first().map(Embedding::dimension))
            .unwrap_or(0);

        if expected == 0 {
            return Err(EmbeddingError::InvalidInput(
                "provider returned zero-length vectors".to_string(),
            ));
        }

        if let Some(bad) = embeddings.iter().find(|e| e.dimension() != expected) {
            return Err(EmbeddingError::DimensionMismatch {
                expected,
                actual: bad.dimension(),
            });
        }
        Ok(())
    }
}

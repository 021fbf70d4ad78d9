//! Embedding error types.

use thiserror::Error;

use docquery_types::ProviderError;

/// An input rejected by size validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OversizedInput {
    /// Position in the submitted batch
    pub position: usize,
    /// Measured size
    pub size: usize,
}

/// Errors that can occur during embedding operations.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// One or more inputs exceed the provider limit; nothing was sent
    #[error(
        "{} input(s) exceed the size limit of {limit}: {}",
        .oversized.len(),
        describe_oversized(.oversized)
    )]
    ChunkTooLarge {
        limit: usize,
        oversized: Vec<OversizedInput>,
    },

    /// The embedding provider failed
    #[error("Embedding provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Dimension mismatch
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Vectors from different models cannot be compared
    #[error("Model mismatch: index built with {expected}, query embedder is {actual}")]
    ModelMismatch { expected: String, actual: String },
}

fn describe_oversized(oversized: &[OversizedInput]) -> String {
    oversized
        .iter()
        .map(|o| format!("#{} ({})", o.position, o.size))
        .collect::<Vec<_>>()
        .join(", ")
}

//! Session error types.

use thiserror::Error;

use docquery_agent::AgentError;
use docquery_embeddings::EmbeddingError;
use docquery_ingest::IngestError;
use docquery_types::{ConfigError, ProviderError};
use docquery_vector::VectorError;

/// Errors surfaced to the session's caller.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A query arrived before any document was indexed
    #[error("No document loaded")]
    NoDocument,

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Vector(#[from] VectorError),

    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Background extraction task panicked or was cancelled
    #[error("Task error: {0}")]
    Task(String),
}

//! Agent error types.

use thiserror::Error;

use docquery_embeddings::EmbeddingError;
use docquery_types::ProviderError;
use docquery_vector::VectorError;

/// Errors that end a query run.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The chat model's reply could not be read as a decision
    #[error("Failed to parse the agent's response: {0}")]
    MalformedResponse(String),

    /// The decision named an action outside the tool set
    #[error("Invalid action specified by the agent: {0}")]
    InvalidAction(String),

    #[error("Maximum iterations ({0}) reached without a final answer")]
    IterationBudgetExceeded(usize),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Vector index error: {0}")]
    Vector(#[from] VectorError),
}

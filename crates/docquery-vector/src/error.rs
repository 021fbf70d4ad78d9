//! Vector index error types.

use thiserror::Error;

/// Errors that can occur during vector operations.
#[derive(Debug, Error, PartialEq)]
pub enum VectorError {
    /// Search against an index holding no vectors
    #[error("Index is empty")]
    EmptyIndex,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Dimension mismatch
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

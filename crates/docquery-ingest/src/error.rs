//! Ingest error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while extracting or chunking a document.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Empty or unusable input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The extractor could not read the document
    #[error("Failed to extract text from {path:?}: {message}")]
    Extraction { path: PathBuf, message: String },

    /// No extractor handles this file type
    #[error("Unsupported document type: {0:?}")]
    Unsupported(PathBuf),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

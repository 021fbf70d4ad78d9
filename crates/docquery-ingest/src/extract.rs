//! Text extraction providers.
//!
//! The core only ever sees the extracted text; how it was produced stays here.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::IngestError;

/// Extracts plain text from a document on disk.
pub trait TextExtractor: Send + Sync {
    /// Short provider name for logs.
    fn name(&self) -> &'static str;

    /// Read `path` and return its text.
    fn extract(&self, path: &Path) -> Result<String, IngestError>;
}

/// PDF extraction via pdf-extract. Every page is followed by a newline.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExtractor;

impl TextExtractor for PdfExtractor {
    fn name(&self) -> &'static str {
        "pdf"
    }

    fn extract(&self, path: &Path) -> Result<String, IngestError> {
        if !path.exists() {
            return Err(extraction_error(path, "file does not exist"));
        }

        // pdf-extract panics on some malformed inputs
        let pages = catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_by_pages(path)))
            .map_err(|_| extraction_error(path, "PDF parser panicked on malformed input"))?
            .map_err(|e| extraction_error(path, &e.to_string()))?;

        let mut text = String::new();
        for page in &pages {
            text.push_str(page);
            text.push('\n');
        }

        info!(path = ?path, pages = pages.len(), chars = text.len(), "Extracted PDF text");
        Ok(text)
    }
}

/// Reads UTF-8 text files as-is.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn name(&self) -> &'static str {
        "text"
    }

    fn extract(&self, path: &Path) -> Result<String, IngestError> {
        let text =
            std::fs::read_to_string(path).map_err(|e| extraction_error(path, &e.to_string()))?;
        debug!(path = ?path, chars = text.len(), "Read text file");
        Ok(text)
    }
}

/// Pick an extractor by file extension.
pub fn extractor_for(path: &Path) -> Result<Box<dyn TextExtractor>, IngestError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        Some("pdf") => Ok(Box::new(PdfExtractor)),
        Some("txt") | Some("md") | Some("text") => Ok(Box::new(PlainTextExtractor)),
        _ => Err(IngestError::Unsupported(path.to_path_buf())),
    }
}

fn extraction_error(path: &Path, message: &str) -> IngestError {
    IngestError::Extraction {
        path: PathBuf::from(path),
        message: message.to_string(),
    }
}

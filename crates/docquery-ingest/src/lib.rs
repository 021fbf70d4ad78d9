//! # docquery-ingest
//!
//! Turns an input document into retrievable chunks.
//!
//! - [`extract`]: text extraction providers (PDF via pdf-extract, plain text)
//! - [`chunker`]: greedy paragraph accumulation into size-bounded chunks

pub mod chunker;
pub mod error;
pub mod extract;

pub use chunker::{split_text, ChunkBuilder};
pub use error::IngestError;
pub use extract::{extractor_for, PdfExtractor, PlainTextExtractor, TextExtractor};

//! Text chunk type.

use std::ops::Range;

use serde::{Deserialize, Serialize};

/// A contiguous segment of source text used as the unit of retrieval.
///
/// Chunks are created once by the chunker and never modified afterwards.
/// `content` is trimmed; `span` is the byte range of the untrimmed paragraph
/// group in the source text, widened over any neighboring blank lines, so joining `&source[span]` for every chunk with
/// `'\n'` reproduces the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextChunk {
    index: usize,
    content: String,
    char_len: usize,
    span: Range<usize>,
}

impl TextChunk {
    /// Create a chunk. The character length is computed from `content`.
    pub fn new(index: usize, content: impl Into<String>, span: Range<usize>) -> Self {
        let content = content.into();
        let char_len = content.chars().count();
        Self {
            index,
            content,
            char_len,
            span,
        }
    }

    /// Sequence index within the document (0-based, dense).
    pub fn index(&self) -> usize {
        self.index
    }

    /// Trimmed chunk text.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Length of the content in characters.
    pub fn char_len(&self) -> usize {
        self.char_len
    }

    /// Byte length of the content.
    pub fn byte_len(&self) -> usize {
        self.content.len()
    }

    /// Byte range of the untrimmed paragraph group in the source text.
    pub fn span(&self) -> Range<usize> {
        self.span.clone()
    }

    /// Consume the chunk, returning its content.
    pub fn into_content(self) -> String {
        self.content
    }
}

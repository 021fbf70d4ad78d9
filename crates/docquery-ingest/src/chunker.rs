//! Paragraph chunker.
//!
//! Text is split on `'\n'` into paragraphs, which are accumulated greedily.
//! When the next paragraph (plus its separator) would push the running chunk
//! past `max_chunk_size` characters, the running chunk is sealed and a new one
//! starts with that paragraph. A single paragraph longer than the limit is
//! emitted on its own, unsplit.

use std::ops::Range;

use tracing::{debug, trace};

use docquery_types::TextChunk;

use crate::error::IngestError;

/// Incremental builder that groups paragraphs of one source text into chunks.
///
/// Groups that are blank after trimming produce no chunk; their bytes are
/// folded into the span of the previous chunk, or of the next one when
/// nothing precedes them, so the spans still tile the source.
pub struct ChunkBuilder<'a> {
    source: &'a str,
    max_chunk_size: usize,

    /// Byte range of the running group in `source`
    group: Option<Range<usize>>,
    /// Character length of the running group, separators included
    group_chars: usize,
    /// Paragraphs in the running group
    group_paragraphs: usize,

    /// Start of leading blank groups not yet claimed by a chunk
    blank_start: Option<usize>,
    chunks: Vec<TextChunk>,
}

impl<'a> ChunkBuilder<'a> {
    /// Create a builder over `source`.
    pub fn new(source: &'a str, max_chunk_size: usize) -> Self {
        Self {
            source,
            max_chunk_size,
            group: None,
            group_chars: 0,
            group_paragraphs: 0,
            blank_start: None,
            chunks: Vec::new(),
        }
    }

    /// Add the paragraph at byte range `range` of the source.
    ///
    /// Paragraphs must be added in source order.
    pub fn add_paragraph(&mut self, range: Range<usize>) {
        let paragraph_chars = self.source[range.clone()].chars().count();

        let Some(group) = self.group.as_mut() else {
            self.start_group(range, paragraph_chars);
            return;
        };

        if self.group_chars + 1 + paragraph_chars > self.max_chunk_size {
            trace!(
                group_chars = self.group_chars,
                paragraph_chars,
                max = self.max_chunk_size,
                "Chunk boundary"
            );
            self.seal();
            self.start_group(range, paragraph_chars);
            return;
        }

        group.end = range.end;
        self.group_chars += 1 + paragraph_chars;
        self.group_paragraphs += 1;
    }

    fn start_group(&mut self, range: Range<usize>, chars: usize) {
        self.group = Some(range);
        self.group_chars = chars;
        self.group_paragraphs = 1;
    }

    /// Seal the running group into a chunk, or fold it away if it is blank.
    fn seal(&mut self) {
        let Some(span) = self.group.take() else {
            return;
        };
        let paragraphs = std::mem::take(&mut self.group_paragraphs);
        self.group_chars = 0;

        let content = self.source[span.clone()].trim();
        if content.is_empty() {
            trace!(?span, "Folding whitespace-only group");
            match self.chunks.pop() {
                Some(last) => {
                    let extended = last.span().start..span.end;
                    self.chunks
                        .push(TextChunk::new(last.index(), last.into_content(), extended));
                }
                None => {
                    self.blank_start.get_or_insert(span.start);
                }
            }
            return;
        }

        let start = self.blank_start.take().unwrap_or(span.start);
        let chunk = TextChunk::new(self.chunks.len(), content, start..span.end);

        if chunk.char_len() > self.max_chunk_size {
            debug!(
                index = chunk.index(),
                chars = chunk.char_len(),
                paragraphs,
                max = self.max_chunk_size,
                "Emitting oversized single-paragraph chunk"
            );
        }

        self.chunks.push(chunk);
    }

    /// Check if a group is being accumulated.
    pub fn has_pending(&self) -> bool {
        self.group.is_some()
    }

    /// Chunks sealed so far.
    pub fn chunks(&self) -> &[TextChunk] {
        &self.chunks
    }

    /// Seal whatever is left and return every chunk in source order.
    pub fn finish(mut self) -> Vec<TextChunk> {
        self.seal();
        self.chunks
    }
}

/// Split `text` into chunks of at most `max_chunk_size` characters.
///
/// The bound is soft: a paragraph longer than the limit becomes its own chunk.
pub fn split_text(text: &str, max_chunk_size: usize) -> Result<Vec<TextChunk>, IngestError> {
    if text.is_empty() {
        return Err(IngestError::InvalidInput("text must not be empty".to_string()));
    }
    if max_chunk_size == 0 {
        return Err(IngestError::InvalidInput(
            "max_chunk_size must be > 0".to_string(),
        ));
    }

    let mut builder = ChunkBuilder::new(text, max_chunk_size);
    let mut offset = 0;

    for paragraph in text.split('\n') {
        let range = offset..offset + paragraph.len();
        offset = range.end + 1;
        builder.add_paragraph(range);
    }

    let chunks = builder.finish();
    if chunks.is_empty() {
        return Err(IngestError::InvalidInput(
            "text contains no non-whitespace content".to_string(),
        ));
    }

    debug!(
        chunks = chunks.len(),
        chars = text.chars().count(),
        max = max_chunk_size,
        "Split text"
    );
    Ok(chunks)
}

//! Chunking strategies: page (whole document), recursive (structure-aware),
//! fixed (sliding window) and semantic (sentence accumulation).

use serde_json::Value;
use tracing::{debug, info, info_span, trace, Span};

use super::helpers::{
    char_len, estimate_tokens, find_boundary, leading_whitespace, split_recursive,
    split_sentences, TextCursor,
};
use super::types::{Chunk, ChunkConfig, ChunkMetadata, ChunkStrategy};

/// Document id used when the caller does not supply one.
pub const UNKNOWN_DOCUMENT_ID: &str = "unknown";

/// Splits documents into bounded chunks under a fixed configuration.
///
/// Holds only immutable state, so one instance can be shared by any number of
/// threads. Never fails: the worst case for pathological input is a single
/// oversized chunk.
#[derive(Debug, Clone)]
pub struct Chunker {
    config: ChunkConfig,
    span: Span,
}

impl Chunker {
    pub fn new(config: ChunkConfig) -> Self {
        let span = info_span!("chunker", strategy = %config.strategy);
        info!(
            strategy = %config.strategy,
            max_chunk_size = config.max_chunk_size,
            overlap = config.overlap,
            "initialized chunker"
        );
        Self { config, span }
    }

    /// Run every `chunk` call inside `span` instead of the default one.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn config(&self) -> &ChunkConfig {
        &self.config
    }

    pub fn strategy(&self) -> ChunkStrategy {
        self.config.strategy
    }

    /// Split `text` into ordered chunks.
    ///
    /// `metadata` is copied into every chunk before the chunker's own keys are
    /// added. `document_id` defaults to [`UNKNOWN_DOCUMENT_ID`].
    pub fn chunk(
        &self,
        text: &str,
        metadata: Option<&ChunkMetadata>,
        document_id: Option<&str>,
    ) -> Vec<Chunk> {
        let _entered = self.span.enter();
        let empty = ChunkMetadata::new();
        let metadata = metadata.unwrap_or(&empty);
        let document_id = document_id.unwrap_or(UNKNOWN_DOCUMENT_ID);

        let chunks = match self.config.strategy {
            ChunkStrategy::Page => self.chunk_page(text, metadata, document_id),
            ChunkStrategy::Recursive => self.chunk_recursive(text, metadata, document_id),
            ChunkStrategy::Fixed => self.chunk_fixed(text, metadata, document_id),
            ChunkStrategy::Semantic => self.chunk_semantic(text, metadata, document_id),
        };
        debug!(
            document_id,
            chunks = chunks.len(),
            chars = char_len(text),
            "chunked document"
        );
        chunks
    }

    fn max_chunk_size(&self) -> usize {
        self.config.max_chunk_size.max(1)
    }

    // ── Page strategy ───────────────────────────────────────────────────────

    fn chunk_page(&self, text: &str, metadata: &ChunkMetadata, document_id: &str) -> Vec<Chunk> {
        let content = text.trim();
        if content.is_empty() {
            return Vec::new();
        }

        let start = leading_whitespace(text);
        let end = start + char_len(content);
        let mut chunk = build_chunk(
            format!("{document_id}_page"),
            content,
            (start, end),
            0,
            metadata,
            ChunkStrategy::Page,
        );
        chunk
            .metadata
            .insert("total_chunks".to_string(), Value::from(1u64));
        vec![chunk]
    }

    // ── Recursive strategy ──────────────────────────────────────────────────

    fn chunk_recursive(
        &self,
        text: &str,
        metadata: &ChunkMetadata,
        document_id: &str,
    ) -> Vec<Chunk> {
        let total = char_len(text);
        let mut chunks = Vec::new();
        let mut cursor = TextCursor::new(text);

        for fragment in split_recursive(text, self.max_chunk_size()) {
            let content = fragment.trim();
            if content.is_empty() {
                continue;
            }

            let len = char_len(content);
            let start = cursor.seek(content).unwrap_or_else(|| {
                let position = cursor.position();
                trace!(cursor = position, "chunk text not found in source, keeping cursor");
                cursor.skip(len);
                position
            });
            let end = (start + len).min(total);

            let index = chunks.len();
            chunks.push(build_chunk(
                format!("{document_id}_chunk_{index}"),
                content,
                (start, end),
                index,
                metadata,
                ChunkStrategy::Recursive,
            ));
        }
        chunks
    }

    // ── Fixed strategy ──────────────────────────────────────────────────────

    fn chunk_fixed(&self, text: &str, metadata: &ChunkMetadata, document_id: &str) -> Vec<Chunk> {
        let chars: Vec<char> = text.chars().collect();
        let total = chars.len();
        let size = self.max_chunk_size();
        let overlap = self.config.overlap;
        let mut chunks = Vec::new();
        let mut start = 0usize;

        while start < total {
            let mut end = (start + size).min(total);
            if end < total {
                if let Some(boundary) = find_boundary(&chars, start, end) {
                    end = boundary + 1;
                }
            }

            let window: String = chars[start..end].iter().collect();
            let content = window.trim();
            if !content.is_empty() {
                let index = chunks.len();
                chunks.push(build_chunk(
                    format!("{document_id}_chunk_{index}"),
                    content,
                    (start, end),
                    index,
                    metadata,
                    ChunkStrategy::Fixed,
                ));
            }

            if end >= total {
                break;
            }
            // Overlap may not pull the cursor back to or behind the window start.
            let next = end.saturating_sub(overlap);
            start = if next > start { next } else { end };
        }
        chunks
    }

    // ── Semantic strategy ───────────────────────────────────────────────────

    fn chunk_semantic(
        &self,
        text: &str,
        metadata: &ChunkMetadata,
        document_id: &str,
    ) -> Vec<Chunk> {
        let size = self.max_chunk_size();
        let mut acc = SentenceAccumulator::new(text, metadata, document_id);
        let mut buffer = String::new();
        let mut buffer_len = 0usize;

        for sentence in split_sentences(text) {
            if sentence.trim().is_empty() {
                continue;
            }
            let sentence_len = char_len(sentence);

            if sentence_len > size {
                // A sentence that cannot fit anywhere is broken structurally.
                acc.flush(&buffer);
                buffer.clear();
                buffer_len = 0;
                for piece in split_recursive(sentence, size) {
                    acc.flush(&piece);
                }
                continue;
            }

            if buffer_len + sentence_len > size {
                acc.flush(&buffer);
                buffer.clear();
                buffer_len = 0;
            }
            buffer.push_str(sentence);
            buffer.push(' ');
            buffer_len += sentence_len + 1;
        }
        acc.flush(&buffer);
        acc.chunks
    }
}

/// Collects semantic chunks and advances the approximate offset cursor.
struct SentenceAccumulator<'a> {
    metadata: &'a ChunkMetadata,
    document_id: &'a str,
    total: usize,
    cursor: usize,
    chunks: Vec<Chunk>,
}

impl<'a> SentenceAccumulator<'a> {
    fn new(text: &str, metadata: &'a ChunkMetadata, document_id: &'a str) -> Self {
        Self {
            metadata,
            document_id,
            total: char_len(text),
            cursor: 0,
            chunks: Vec::new(),
        }
    }

    /// Emit `buffer` (trimmed) as the next chunk. Offsets are not re-located
    /// in the source: the cursor moves by the chunk length plus one.
    fn flush(&mut self, buffer: &str) {
        let content = buffer.trim();
        if content.is_empty() {
            return;
        }
        let len = char_len(content);
        let start = self.cursor.min(self.total);
        let end = (start + len).min(self.total);
        self.cursor = start + len + 1;

        let index = self.chunks.len();
        self.chunks.push(build_chunk(
            format!("{}_chunk_{index}", self.document_id),
            content,
            (start, end),
            index,
            self.metadata,
            ChunkStrategy::Semantic,
        ));
    }
}

fn build_chunk(
    id: String,
    content: &str,
    (start_offset, end_offset): (usize, usize),
    index: usize,
    base: &ChunkMetadata,
    strategy: ChunkStrategy,
) -> Chunk {
    let mut metadata = base.clone();
    metadata.insert("chunk_index".to_string(), Value::from(index as u64));
    metadata.insert(
        "chunking_strategy".to_string(),
        Value::from(strategy.as_str()),
    );

    Chunk {
        content: content.to_string(),
        id,
        start_offset,
        end_offset,
        token_estimate: estimate_tokens(content),
        metadata,
    }
}

//! Text chunking engine.
//!
//! Splits note text into bounded, ordered chunks suitable for embedding under
//! one of four strategies: page (whole document), recursive (paragraph, line,
//! sentence, word, character), fixed (sliding window with overlap) and
//! semantic (sentence accumulation).

mod helpers;
mod strategies;
mod types;

pub use helpers::estimate_tokens;
pub use strategies::{Chunker, UNKNOWN_DOCUMENT_ID};
pub use types::{Chunk, ChunkConfig, ChunkMetadata, ChunkStrategy, UnknownStrategy};

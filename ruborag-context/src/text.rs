//! Fixed-size text segmentation for embedding.
//!
//! Documents are split into consecutive, non-overlapping segments measured in
//! Unicode code points rather than bytes, so a multi-byte character is never
//! cut in half. Each segment becomes a [`TextChunk`] addressed by its zero-based
//! `sequence` within the document; that sequence is the `chunk_index` the
//! retriever stores alongside the embedding.
//!
//! # Example
//!
//! ```
//! use ruborag_context::text::{Chunking, chunk};
//!
//! let segments = chunk("ownership and borrowing", 10).unwrap();
//! assert_eq!(segments, vec!["ownership ", "and borrow", "ing"]);
//!
//! // Concatenating the segments always reconstructs the input.
//! assert_eq!(segments.concat(), "ownership and borrowing");
//!
//! // With chunking disabled the whole document is a single chunk.
//! let chunks = Chunking::Disabled.split("doc.txt", "ownership and borrowing").unwrap();
//! assert_eq!(chunks.len(), 1);
//! assert_eq!(chunks[0].sequence, 0);
//! ```

use crate::error::{ChunkError, Result};
use serde::{Deserialize, Serialize};

/// Chunk size used when none is configured, in code points.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Splits `text` into segments of at most `size` code points each.
///
/// The final segment may be shorter than `size`. An empty `text` yields an
/// empty vector.
///
/// # Errors
/// Returns [`ChunkError::InvalidChunkSize`] when `size` is zero.
pub fn chunk(text: &str, size: usize) -> Result<Vec<String>> {
    if size == 0 {
        return Err(ChunkError::InvalidChunkSize { size });
    }

    let mut segments = Vec::with_capacity(text.len() / size + 1);
    let mut segment_start = 0;
    let mut code_points = 0;

    for (byte_offset, _) in text.char_indices() {
        if code_points == size {
            segments.push(text[segment_start..byte_offset].to_string());
            segment_start = byte_offset;
            code_points = 0;
        }
        code_points += 1;
    }

    if segment_start < text.len() {
        segments.push(text[segment_start..].to_string());
    }

    Ok(segments)
}

/// Whether a document is split into fixed-size chunks or embedded whole.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum Chunking {
    /// Split into segments of at most `size` code points
    Enabled { size: usize },
    /// Treat the whole document as chunk 0
    #[default]
    Disabled,
}

impl Chunking {
    /// Chunking with the default size.
    pub fn enabled() -> Self {
        Chunking::Enabled {
            size: DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, Chunking::Enabled { .. })
    }

    /// Splits a document into addressed chunks, in document order.
    ///
    /// `source` is copied onto every chunk so callers can store it as the
    /// chunk's source identifier. An empty document produces no chunks in
    /// either mode.
    pub fn split(&self, source: &str, text: &str) -> Result<Vec<TextChunk>> {
        let segments = match *self {
            Chunking::Enabled { size } => chunk(text, size)?,
            Chunking::Disabled if text.is_empty() => Vec::new(),
            Chunking::Disabled => vec![text.to_string()],
        };

        Ok(segments
            .into_iter()
            .enumerate()
            .map(|(sequence, chunk_text)| TextChunk {
                source: source.to_string(),
                sequence,
                chunk_text,
            })
            .collect())
    }
}

/// A single segment of a document along with its address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextChunk {
    /// Identifier of the document the chunk came from.
    pub source: String,
    /// The position of this chunk within the document (0-indexed).
    pub sequence: usize,
    /// The text content of this specific chunk.
    pub chunk_text: String,
}

impl TextChunk {
    /// Length of the chunk in code points.
    pub fn char_len(&self) -> usize {
        self.chunk_text.chars().count()
    }
}

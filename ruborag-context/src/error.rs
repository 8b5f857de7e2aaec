//! Error types for chunking and normalization

use std::path::PathBuf;

/// Result type for context operations.
pub type Result<T> = std::result::Result<T, ChunkError>;

/// Errors raised while turning raw documents into chunks.
#[derive(Debug, thiserror::Error)]
pub enum ChunkError {
    /// The requested chunk size cannot produce any segment
    #[error("Invalid chunk size {size}: must be greater than zero")]
    InvalidChunkSize { size: usize },

    /// The document is not valid UTF-8 text
    #[error("File is not valid UTF-8 text: {path}")]
    NotUtf8 { path: PathBuf },

    /// IO errors when reading documents
    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

//! Error types for ingestion, storage and retrieval

use ruborag_context::ChunkError;
use ruborag_embed::EmbedError;
use std::path::PathBuf;

/// Result type for retriever operations.
pub type Result<T> = std::result::Result<T, RetrieverError>;

#[derive(Debug, thiserror::Error)]
pub enum RetrieverError {
    /// A caller passed a value the operation cannot accept
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// A stored embedding blob could not be decoded
    #[error("Corrupt embedding blob{}: {message}", location(.source_id, .chunk_index))]
    CorruptBlob {
        message: String,
        source_id: Option<String>,
        chunk_index: Option<i64>,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration in {path}: {message}")]
    Config { path: PathBuf, message: String },

    #[error("Failed to read {path}: {message}")]
    Read { path: PathBuf, message: String },

    #[error(transparent)]
    Embedding(#[from] EmbedError),

    #[error(transparent)]
    Chunk(#[from] ChunkError),

    /// Retrieval was asked to rank against an empty store
    #[error("no embeddings found in database")]
    NothingToSearch,
}

fn location(source_id: &Option<String>, chunk_index: &Option<i64>) -> String {
    match (source_id, chunk_index) {
        (Some(source), Some(index)) => format!(" for {source} (chunk {index})"),
        _ => String::new(),
    }
}

impl RetrieverError {
    pub fn invalid_argument<S: Into<String>>(message: S) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    pub fn corrupt_blob<S: Into<String>>(message: S) -> Self {
        Self::CorruptBlob {
            message: message.into(),
            source_id: None,
            chunk_index: None,
        }
    }

    /// Attach the row a decoding failure came from.
    pub fn at_row(self, source: &str, index: i64) -> Self {
        match self {
            Self::CorruptBlob { message, .. } => Self::CorruptBlob {
                message,
                source_id: Some(source.to_string()),
                chunk_index: Some(index),
            },
            other => other,
        }
    }
}

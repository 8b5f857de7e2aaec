pub mod error;
pub mod normalize;
pub mod text;

// Re-export the chunking and normalization entry points for external use
pub use error::{ChunkError, Result};
pub use normalize::{normalize_file, normalize_html, parsed_output_path};
pub use text::{Chunking, DEFAULT_CHUNK_SIZE, TextChunk, chunk};

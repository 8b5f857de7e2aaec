//! Ingestion and retrieval over an [`EmbeddingStore`](crate::storage::EmbeddingStore).

pub mod ingest;
pub mod ranker;
pub mod search;
pub mod traversal;

//! ruborag-retriever: embedding storage and similarity retrieval
//!
//! Documents are chunked, embedded through a remote model, and stored in a
//! single-file SQLite database. Queries are embedded the same way and ranked
//! against every stored vector by cosine similarity.
//!
//! ## Key Modules
//!
//! - **[`retrieval`]**: ingestion, traversal, ranking and search
//! - **[`storage`]**: the [`EmbeddingStore`](storage::EmbeddingStore) trait, its SQLite implementation, and the vector codec
//! - **[`config`]**: settings loaded from TOML
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ruborag_context::Chunking;
//! use ruborag_embed::{EmbedConfig, GeminiProvider};
//! use ruborag_retriever::retrieval::ingest::{IngestConfig, Ingestor};
//! use ruborag_retriever::retrieval::search::{SearchOptions, search};
//! use ruborag_retriever::storage::SqliteStore;
//! use std::path::{Path, PathBuf};
//! use std::sync::Arc;
//!
//! # async fn example() -> ruborag_retriever::Result<()> {
//! let provider = Arc::new(GeminiProvider::from_env(EmbedConfig::default())?);
//! let store = Arc::new(SqliteStore::open(Path::new("ruborag.db")).await?);
//!
//! let config = IngestConfig::default()
//!     .with_chunking(Chunking::enabled())
//!     .with_persist(true);
//! Ingestor::new(provider.clone(), config)
//!     .with_store(store.clone())
//!     .ingest_files(&[PathBuf::from("book/ch01.txt")])
//!     .await?;
//!
//! let options = SearchOptions::default();
//! let hits = search(&*provider, &*store, "what is a slice?", options).await?;
//! for hit in hits {
//!     println!("{} (chunk {}): {:.4}", hit.source_id, hit.chunk_index, hit.score);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! write: file → Chunking → EmbeddingProvider → codec → SqliteStore
//! read:  query → EmbeddingProvider → ranker ← SqliteStore::scan_all
//! ```

pub mod config;
pub mod error;
pub mod retrieval;
pub mod storage;

pub use error::{Result, RetrieverError};

//! Persistence for embedding records.
//!
//! Records are keyed by `(source_id, chunk_index)` and are never updated in
//! place. The [`EmbeddingStore`] trait is the seam the ingestion and search
//! paths are written against; [`sqlite_store::SqliteStore`] is the on-disk
//! implementation.
//!
//! ## Schema
//!
//! ```sql
//! CREATE TABLE embeddings (
//!     id INTEGER PRIMARY KEY AUTOINCREMENT,
//!     source_file TEXT NOT NULL,
//!     chunk_index INTEGER NOT NULL,
//!     content TEXT NOT NULL,
//!     embedding BLOB NOT NULL          -- 4 * dimension bytes, LE f32
//! );
//! ```

use crate::error::Result;
use async_trait::async_trait;
use serde::Serialize;

pub mod codec;
pub mod sqlite_store;

pub use sqlite_store::SqliteStore;

/// Default database file name, created in the base directory.
pub const DEFAULT_DB_NAME: &str = "ruborag.db";

/// A decoded row as returned by a full scan.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredVector {
    pub source_id: String,
    pub chunk_index: i64,
    pub vector: Vec<f32>,
}

/// Whether [`EmbeddingStore::insert_if_absent`] wrote a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    AlreadyPresent,
}

/// Summary of what a store holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub records: u64,
    pub sources: u64,
    /// Dimension of the stored vectors, `None` while the store is empty
    pub dimension: Option<usize>,
}

/// Durable storage for embedding records.
#[async_trait]
pub trait EmbeddingStore: Send + Sync {
    /// Whether a record exists for this key.
    async fn exists(&self, source_id: &str, chunk_index: i64) -> Result<bool>;

    /// Insert a record without checking for an existing one.
    ///
    /// Fails with `InvalidArgument` when `vector` is empty or its dimension
    /// differs from what the store already holds.
    async fn insert(
        &self,
        source_id: &str,
        chunk_index: i64,
        content: &str,
        vector: &[f32],
    ) -> Result<()>;

    /// Insert a record unless one already exists for the key, as one statement.
    async fn insert_if_absent(
        &self,
        source_id: &str,
        chunk_index: i64,
        content: &str,
        vector: &[f32],
    ) -> Result<InsertOutcome>;

    /// Text stored for a key, if any.
    async fn stored_content(&self, source_id: &str, chunk_index: i64) -> Result<Option<String>>;

    /// Load and decode every record.
    ///
    /// The first malformed row fails the whole scan with `CorruptBlob`.
    async fn scan_all(&self) -> Result<Vec<StoredVector>>;

    async fn stats(&self) -> Result<StoreStats>;
}

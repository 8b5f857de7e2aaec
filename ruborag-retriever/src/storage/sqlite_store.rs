//! SQLite implementation of [`EmbeddingStore`].
//!
//! One table holds every record; vectors are encoded with [`codec`] and
//! similarity search is done in memory over a full scan, so the store itself
//! only needs point lookups and ordered reads.

use super::{EmbeddingStore, InsertOutcome, StoreStats, StoredVector, codec};
use crate::error::{Result, RetrieverError};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Embedding records in a single-file SQLite database.
#[derive(Clone, Debug)]
pub struct SqliteStore {
    path: Option<PathBuf>,
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens (creating if needed) the database at `db_path`.
    pub async fn open(db_path: &Path) -> Result<Self> {
        Self::connect(db_path, true).await
    }

    /// Opens the database at `db_path` only if the file already exists.
    ///
    /// Read paths use this so that querying a directory without an index
    /// leaves no empty database behind.
    pub async fn open_existing(db_path: &Path) -> Result<Option<Self>> {
        if !db_path.is_file() {
            debug!("No embedding store at {}", db_path.display());
            return Ok(None);
        }
        Self::connect(db_path, false).await.map(Some)
    }

    async fn connect(db_path: &Path, create_if_missing: bool) -> Result<Self> {
        let pool = SqlitePool::connect_with(
            SqliteConnectOptions::new()
                .filename(db_path)
                .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
                .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
                .busy_timeout(std::time::Duration::from_secs(5))
                .create_if_missing(create_if_missing),
        )
        .await?;
        debug!("Opened embedding store at {}", db_path.display());
        Self::new_with_pool(Some(db_path.to_path_buf()), pool).await
    }

    /// Opens a private in-memory store, used by tests and dry runs.
    pub async fn open_memory() -> Result<Self> {
        // Every pooled connection to `sqlite::memory:` is a separate database,
        // so pin the pool to one connection that never expires.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        Self::new_with_pool(None, pool).await
    }

    async fn new_with_pool(path: Option<PathBuf>, pool: SqlitePool) -> Result<Self> {
        Self::create_tables(&pool).await?;
        Ok(Self { path, pool })
    }

    async fn create_tables(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS embeddings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                source_file TEXT NOT NULL,
                chunk_index INTEGER NOT NULL,
                content TEXT NOT NULL,
                embedding BLOB NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_embeddings_source_chunk ON embeddings(source_file, chunk_index)",
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Location of the database file, `None` for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Byte length of the first stored blob; every other row must match it.
    async fn reference_blob_len(&self) -> Result<Option<usize>> {
        let len: Option<i64> =
            sqlx::query_scalar("SELECT length(embedding) FROM embeddings ORDER BY id LIMIT 1")
                .fetch_optional(&self.pool)
                .await?;
        Ok(len.map(|l| l as usize))
    }

    /// Encode `vector` after checking it fits the store.
    async fn checked_blob(&self, vector: &[f32]) -> Result<Vec<u8>> {
        if vector.is_empty() {
            return Err(RetrieverError::invalid_argument(
                "cannot store an empty embedding vector",
            ));
        }
        if vector.iter().any(|v| !v.is_finite()) {
            return Err(RetrieverError::invalid_argument(
                "cannot store an embedding with non-finite values",
            ));
        }

        let blob = codec::encode(vector);
        if let Some(expected) = self.reference_blob_len().await? {
            if expected != blob.len() {
                return Err(RetrieverError::invalid_argument(format!(
                    "embedding has {} dimensions but the store holds {}-dimensional vectors",
                    vector.len(),
                    codec::dimension_of(expected).unwrap_or(expected)
                )));
            }
        }
        Ok(blob)
    }
}

#[async_trait]
impl EmbeddingStore for SqliteStore {
    async fn exists(&self, source_id: &str, chunk_index: i64) -> Result<bool> {
        let found: Option<i64> = sqlx::query_scalar(
            "SELECT 1 FROM embeddings WHERE source_file = ? AND chunk_index = ? LIMIT 1",
        )
        .bind(source_id)
        .bind(chunk_index)
        .fetch_optional(&self.pool)
        .await?;
        Ok(found.is_some())
    }

    async fn insert(
        &self,
        source_id: &str,
        chunk_index: i64,
        content: &str,
        vector: &[f32],
    ) -> Result<()> {
        let blob = self.checked_blob(vector).await?;

        sqlx::query(
            "INSERT INTO embeddings (source_file, chunk_index, content, embedding) VALUES (?, ?, ?, ?)",
        )
        .bind(source_id)
        .bind(chunk_index)
        .bind(content)
        .bind(&blob)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn insert_if_absent(
        &self,
        source_id: &str,
        chunk_index: i64,
        content: &str,
        vector: &[f32],
    ) -> Result<InsertOutcome> {
        let blob = self.checked_blob(vector).await?;

        let result = sqlx::query(
            r#"
            INSERT INTO embeddings (source_file, chunk_index, content, embedding)
            SELECT ?, ?, ?, ?
            WHERE NOT EXISTS (
                SELECT 1 FROM embeddings WHERE source_file = ? AND chunk_index = ?
            )
            "#,
        )
        .bind(source_id)
        .bind(chunk_index)
        .bind(content)
        .bind(&blob)
        .bind(source_id)
        .bind(chunk_index)
        .execute(&self.pool)
        .await?;

        Ok(if result.rows_affected() == 0 {
            InsertOutcome::AlreadyPresent
        } else {
            InsertOutcome::Inserted
        })
    }

    async fn stored_content(&self, source_id: &str, chunk_index: i64) -> Result<Option<String>> {
        let content: Option<String> = sqlx::query_scalar(
            "SELECT content FROM embeddings WHERE source_file = ? AND chunk_index = ? ORDER BY id LIMIT 1",
        )
        .bind(source_id)
        .bind(chunk_index)
        .fetch_optional(&self.pool)
        .await?;
        Ok(content)
    }

    async fn scan_all(&self) -> Result<Vec<StoredVector>> {
        let rows =
            sqlx::query("SELECT source_file, chunk_index, embedding FROM embeddings ORDER BY id")
                .fetch_all(&self.pool)
                .await?;

        let mut records = Vec::with_capacity(rows.len());
        let mut dimension: Option<usize> = None;

        for row in rows {
            let source_id: String = row.get("source_file");
            let chunk_index: i64 = row.get("chunk_index");
            let blob: Vec<u8> = row.get("embedding");

            let vector = codec::decode(&blob).map_err(|e| e.at_row(&source_id, chunk_index))?;
            if vector.is_empty() {
                return Err(
                    RetrieverError::corrupt_blob("empty embedding").at_row(&source_id, chunk_index)
                );
            }
            let expected = *dimension.get_or_insert(vector.len());
            if vector.len() != expected {
                return Err(RetrieverError::corrupt_blob(format!(
                    "expected {expected} dimensions, found {}",
                    vector.len()
                ))
                .at_row(&source_id, chunk_index));
            }

            records.push(StoredVector {
                source_id,
                chunk_index,
                vector,
            });
        }

        debug!("Scanned {} embedding records", records.len());
        Ok(records)
    }

    async fn stats(&self) -> Result<StoreStats> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS records, COUNT(DISTINCT source_file) AS sources FROM embeddings",
        )
        .fetch_one(&self.pool)
        .await?;

        let records: i64 = row.get("records");
        let sources: i64 = row.get("sources");
        let dimension = self
            .reference_blob_len()
            .await?
            .and_then(codec::dimension_of);

        Ok(StoreStats {
            records: records as u64,
            sources: sources as u64,
            dimension,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn insert_raw_blob(
        store: &SqliteStore,
        source: &str,
        index: i64,
        blob: &[u8],
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO embeddings (source_file, chunk_index, content, embedding) VALUES (?, ?, '', ?)",
        )
        .bind(source)
        .bind(index)
        .bind(blob)
        .execute(store.pool())
        .await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_insert_and_exists() -> Result<()> {
        let store = SqliteStore::open_memory().await?;

        assert!(!store.exists("doc.txt", 0).await?);
        store.insert("doc.txt", 0, "hello", &[1.0, 0.0]).await?;

        assert!(store.exists("doc.txt", 0).await?);
        assert!(!store.exists("doc.txt", 1).await?);
        assert!(!store.exists("other.txt", 0).await?);
        assert_eq!(
            store.stored_content("doc.txt", 0).await?.as_deref(),
            Some("hello")
        );
        assert_eq!(store.stored_content("doc.txt", 1).await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_insert_if_absent_is_idempotent() -> Result<()> {
        let store = SqliteStore::open_memory().await?;

        let first = store.insert_if_absent("doc.txt", 0, "a", &[0.5, 0.5]).await?;
        let second = store.insert_if_absent("doc.txt", 0, "b", &[0.1, 0.9]).await?;

        assert_eq!(first, InsertOutcome::Inserted);
        assert_eq!(second, InsertOutcome::AlreadyPresent);

        let records = store.scan_all().await?;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].vector, vec![0.5, 0.5]);
        assert_eq!(store.stored_content("doc.txt", 0).await?.as_deref(), Some("a"));
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_vector_rejected() -> Result<()> {
        let store = SqliteStore::open_memory().await?;

        let err = store.insert("doc.txt", 0, "x", &[]).await.unwrap_err();
        assert!(matches!(err, RetrieverError::InvalidArgument { .. }));
        let err = store.insert_if_absent("doc.txt", 0, "x", &[]).await.unwrap_err();
        assert!(matches!(err, RetrieverError::InvalidArgument { .. }));
        assert!(!store.exists("doc.txt", 0).await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_non_finite_vector_rejected() -> Result<()> {
        let store = SqliteStore::open_memory().await?;

        for bad in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
            let err = store.insert("a.txt", 0, "x", &[bad, 1.0]).await.unwrap_err();
            assert!(matches!(err, RetrieverError::InvalidArgument { .. }));
            let err = store
                .insert_if_absent("a.txt", 0, "x", &[1.0, bad])
                .await
                .unwrap_err();
            assert!(matches!(err, RetrieverError::InvalidArgument { .. }));
        }
        assert_eq!(store.stats().await?.records, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_mixed_dimensions_rejected_on_insert() -> Result<()> {
        let store = SqliteStore::open_memory().await?;
        store.insert("a.txt", 0, "a", &[1.0, 2.0, 3.0]).await?;

        let err = store.insert("b.txt", 0, "b", &[1.0, 2.0]).await.unwrap_err();
        assert!(matches!(err, RetrieverError::InvalidArgument { .. }));
        assert!(err.to_string().contains("3-dimensional"));
        Ok(())
    }

    #[tokio::test]
    async fn test_scan_all_decodes_in_insertion_order() -> Result<()> {
        let store = SqliteStore::open_memory().await?;
        store.insert("doc.txt", 0, "first", &[1.0, 0.0]).await?;
        store.insert("doc.txt", 1, "second", &[0.0, 1.0]).await?;
        store.insert("notes.txt", 0, "third", &[0.6, 0.8]).await?;

        let records = store.scan_all().await?;
        assert_eq!(
            records,
            vec![
                StoredVector {
                    source_id: "doc.txt".to_string(),
                    chunk_index: 0,
                    vector: vec![1.0, 0.0],
                },
                StoredVector {
                    source_id: "doc.txt".to_string(),
                    chunk_index: 1,
                    vector: vec![0.0, 1.0],
                },
                StoredVector {
                    source_id: "notes.txt".to_string(),
                    chunk_index: 0,
                    vector: vec![0.6, 0.8],
                },
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_scan_all_fails_on_corrupt_blob() -> Result<()> {
        let store = SqliteStore::open_memory().await?;
        store.insert("good.txt", 0, "ok", &[1.0, 0.0]).await?;
        insert_raw_blob(&store, "bad.txt", 2, &[0u8; 7]).await?;

        match store.scan_all().await {
            Err(RetrieverError::CorruptBlob {
                source_id,
                chunk_index,
                ..
            }) => {
                assert_eq!(source_id.as_deref(), Some("bad.txt"));
                assert_eq!(chunk_index, Some(2));
            }
            other => panic!("expected CorruptBlob, got {other:?}"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_scan_all_fails_on_dimension_drift() -> Result<()> {
        let store = SqliteStore::open_memory().await?;
        store.insert("a.txt", 0, "a", &[1.0, 0.0]).await?;
        insert_raw_blob(&store, "b.txt", 0, &codec::encode(&[1.0, 0.0, 0.0])).await?;

        let err = store.scan_all().await.unwrap_err();
        assert!(matches!(err, RetrieverError::CorruptBlob { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_stats() -> Result<()> {
        let store = SqliteStore::open_memory().await?;
        assert_eq!(store.stats().await?, StoreStats::default());

        store.insert("doc.txt", 0, "a", &[1.0, 0.0, 0.0]).await?;
        store.insert("doc.txt", 1, "b", &[0.0, 1.0, 0.0]).await?;
        store.insert("other.txt", 0, "c", &[0.0, 0.0, 1.0]).await?;

        assert_eq!(
            store.stats().await?,
            StoreStats {
                records: 3,
                sources: 2,
                dimension: Some(3),
            }
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_reopen_file_store_keeps_records() -> Result<()> {
        let temp_dir = tempdir()?;
        let db_path = temp_dir.path().join("ruborag.db");

        {
            let store = SqliteStore::open(&db_path).await?;
            assert_eq!(store.path(), Some(db_path.as_path()));
            store.insert("doc.txt", 0, "persisted", &[0.25, 0.75]).await?;
            store.pool().close().await;
        }

        // Schema creation runs again on every open and must not disturb data.
        let reopened = SqliteStore::open(&db_path).await?;
        assert!(reopened.exists("doc.txt", 0).await?);
        assert_eq!(reopened.scan_all().await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_open_existing_does_not_create_file() -> Result<()> {
        let temp_dir = tempdir()?;
        let db_path = temp_dir.path().join("ruborag.db");

        assert!(SqliteStore::open_existing(&db_path).await?.is_none());
        assert!(!db_path.exists());

        SqliteStore::open(&db_path)
            .await?
            .insert("doc.txt", 0, "kept", &[1.0, 0.0])
            .await?;
        let store = SqliteStore::open_existing(&db_path).await?;
        assert_eq!(store.map(|s| s.path().is_some()), Some(true));
        Ok(())
    }
}

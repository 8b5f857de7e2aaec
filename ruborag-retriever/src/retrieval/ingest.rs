//! Ingestion: read, chunk, embed and store documents.
//!
//! Work is strictly sequential. Files are processed one at a time, and within
//! a file each chunk's embedding call is awaited before the next is issued.
//!
//! ## Pipeline
//!
//! ```text
//! file → read → Chunking::split → [exists? → embed → insert_if_absent] per chunk
//! ```
//!
//! Without chunking, a document is a single chunk and one existence check on
//! chunk 0 decides whether the whole file is skipped. With chunking, every
//! chunk is checked on its own, so an interrupted ingest resumes where it
//! stopped.
//!
//! A failure while embedding or storing any chunk aborts that file only;
//! chunks stored before the failure stay stored, and the batch moves on.

use crate::error::{Result, RetrieverError};
use crate::storage::{EmbeddingStore, InsertOutcome};
use ruborag_context::{ChunkError, Chunking, TextChunk};
use ruborag_embed::{EmbedError, EmbeddingProvider};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Default bound on a single embedding call.
pub const DEFAULT_EMBED_TIMEOUT: Duration = Duration::from_secs(60);

/// How a batch of files is ingested.
///
/// Built once up front and passed in; nothing reads global flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestConfig {
    /// Whether documents are split, and at what size
    pub chunking: Chunking,
    /// Write embeddings to the store; when false, only embed and report
    pub persist: bool,
    /// Upper bound on each embedding call
    pub embed_timeout: Duration,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            chunking: Chunking::Disabled,
            persist: false,
            embed_timeout: DEFAULT_EMBED_TIMEOUT,
        }
    }
}

impl IngestConfig {
    pub fn with_chunking(mut self, chunking: Chunking) -> Self {
        self.chunking = chunking;
        self
    }

    pub fn with_persist(mut self, persist: bool) -> Self {
        self.persist = persist;
        self
    }

    pub fn with_embed_timeout(mut self, timeout: Duration) -> Self {
        self.embed_timeout = timeout;
        self
    }
}

/// What happened to one file.
#[derive(Debug)]
pub enum FileOutcome {
    /// Every chunk is now stored (or was embedded, on a dry run)
    Completed {
        embedded: usize,
        skipped: usize,
        /// Dimension of the vectors produced, if any chunk was embedded
        dimension: Option<usize>,
    },
    /// Already embedded as a whole; no embedding calls were made
    Skipped,
    /// Processing stopped at the first failing chunk
    Failed { error: RetrieverError },
}

/// Result of processing a single file
#[derive(Debug)]
pub struct FileReport {
    pub path: PathBuf,
    pub source_id: String,
    pub outcome: FileOutcome,
    pub processing_time: Duration,
}

/// Per-file results of a batch, in processing order.
#[derive(Debug, Default)]
pub struct IngestReport {
    pub files: Vec<FileReport>,
}

impl IngestReport {
    /// Chunks embedded across the batch.
    pub fn embedded(&self) -> usize {
        self.files
            .iter()
            .map(|f| match f.outcome {
                FileOutcome::Completed { embedded, .. } => embedded,
                _ => 0,
            })
            .sum()
    }

    /// Chunks skipped as already present, not counting wholly skipped files.
    pub fn skipped_chunks(&self) -> usize {
        self.files
            .iter()
            .map(|f| match f.outcome {
                FileOutcome::Completed { skipped, .. } => skipped,
                _ => 0,
            })
            .sum()
    }

    pub fn skipped_files(&self) -> usize {
        self.files
            .iter()
            .filter(|f| matches!(f.outcome, FileOutcome::Skipped))
            .count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &FileReport> {
        self.files
            .iter()
            .filter(|f| matches!(f.outcome, FileOutcome::Failed { .. }))
    }

    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }
}

/// Drives documents through the embedding gateway into a store.
pub struct Ingestor {
    provider: Arc<dyn EmbeddingProvider>,
    store: Option<Arc<dyn EmbeddingStore>>,
    config: IngestConfig,
}

impl Ingestor {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, config: IngestConfig) -> Self {
        Self {
            provider,
            store: None,
            config,
        }
    }

    /// Attach the store embeddings are written to. Required when persisting.
    pub fn with_store(mut self, store: Arc<dyn EmbeddingStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Ingest `paths` in order, one file at a time.
    ///
    /// A failing file is recorded in the report and the batch continues. The
    /// only batch-level error is asking to persist without a store.
    pub async fn ingest_files(&self, paths: &[PathBuf]) -> Result<IngestReport> {
        if self.config.persist && self.store.is_none() {
            return Err(RetrieverError::invalid_argument(
                "persisting embeddings requires an open store",
            ));
        }

        info!(
            "Ingesting {} files ({}, {})",
            paths.len(),
            match self.config.chunking {
                Chunking::Enabled { size } => format!("chunks of {size}"),
                Chunking::Disabled => "whole documents".to_string(),
            },
            if self.config.persist { "persisting" } else { "dry run" }
        );

        let mut report = IngestReport::default();
        for path in paths {
            let file_report = self.ingest_file(path).await;
            if let FileOutcome::Failed { error } = &file_report.outcome {
                warn!("Failed to ingest {}: {}", path.display(), error);
            }
            report.files.push(file_report);
        }

        info!(
            "Ingestion finished: {} chunks embedded, {} chunks skipped, {} files skipped, {} files failed",
            report.embedded(),
            report.skipped_chunks(),
            report.skipped_files(),
            report.failures().count()
        );
        Ok(report)
    }

    /// Ingest a single file, capturing any failure in the outcome.
    pub async fn ingest_file(&self, path: &Path) -> FileReport {
        let started = Instant::now();
        let source_id = source_id_for(path);

        let outcome = match self.process_file(path, &source_id).await {
            Ok(outcome) => outcome,
            Err(error) => FileOutcome::Failed { error },
        };

        FileReport {
            path: path.to_path_buf(),
            source_id,
            outcome,
            processing_time: started.elapsed(),
        }
    }

    async fn process_file(&self, path: &Path, source_id: &str) -> Result<FileOutcome> {
        debug!("Processing file: {}", path.display());

        if !self.config.chunking.is_enabled() {
            if let Some(store) = self.persisting_store() {
                if store.exists(source_id, 0).await? {
                    info!("{} already embedded, skipping", source_id);
                    return Ok(FileOutcome::Skipped);
                }
            }
        }

        let text = read_document(path).await?;
        let chunks = self.config.chunking.split(source_id, &text)?;
        debug!("Split {} into {} chunks", source_id, chunks.len());

        let total = chunks.len();
        let mut embedded = 0;
        let mut skipped = 0;
        let mut dimension = None;

        for chunk in &chunks {
            let index = chunk.sequence as i64;

            if self.config.chunking.is_enabled() {
                if let Some(store) = self.persisting_store() {
                    if store.exists(source_id, index).await? {
                        self.warn_if_rechunked(store, chunk).await?;
                        info!(
                            "{} (chunk {}/{}) already embedded, skipping",
                            source_id,
                            chunk.sequence + 1,
                            total
                        );
                        skipped += 1;
                        continue;
                    }
                }
            }

            let vector = self.embed(&chunk.chunk_text).await?;
            dimension = Some(vector.len());

            match self.persisting_store() {
                Some(store) => {
                    match store
                        .insert_if_absent(source_id, index, &chunk.chunk_text, &vector)
                        .await?
                    {
                        InsertOutcome::Inserted => {
                            info!(
                                "stored embedding for {} (chunk {}/{})",
                                source_id,
                                chunk.sequence + 1,
                                total
                            );
                            embedded += 1;
                        }
                        InsertOutcome::AlreadyPresent => {
                            debug!("{} (chunk {}) was stored concurrently", source_id, index);
                            skipped += 1;
                        }
                    }
                }
                None => {
                    info!(
                        "embedded {} (chunk {}/{}, {} dimensions)",
                        source_id,
                        chunk.sequence + 1,
                        total,
                        vector.len()
                    );
                    embedded += 1;
                }
            }
        }

        Ok(FileOutcome::Completed {
            embedded,
            skipped,
            dimension,
        })
    }

    fn persisting_store(&self) -> Option<&dyn EmbeddingStore> {
        if self.config.persist {
            self.store.as_deref()
        } else {
            None
        }
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let timeout = self.config.embed_timeout;
        match tokio::time::timeout(timeout, self.provider.embed_text(text)).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(EmbedError::unavailable(format!(
                "embedding call timed out after {}s",
                timeout.as_secs_f32()
            ))
            .into()),
        }
    }

    /// Existing chunk indices are never recomputed, so a different chunk size
    /// leaves stale text under the old keys.
    async fn warn_if_rechunked(&self, store: &dyn EmbeddingStore, chunk: &TextChunk) -> Result<()> {
        let stored = store
            .stored_content(&chunk.source, chunk.sequence as i64)
            .await?;
        if stored.is_some_and(|content| content != chunk.chunk_text) {
            warn!(
                "{} (chunk {}) differs from the stored text; re-chunking an embedded document is not supported",
                chunk.source, chunk.sequence
            );
        }
        Ok(())
    }
}

/// Identifier a file's chunks are stored under: its file name.
pub fn source_id_for(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

async fn read_document(path: &Path) -> Result<String> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| RetrieverError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    String::from_utf8(bytes).map_err(|_| {
        ChunkError::NotUtf8 {
            path: path.to_path_buf(),
        }
        .into()
    })
}

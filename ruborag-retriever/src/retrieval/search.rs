//! The read path: embed a query and rank the whole store against it.

use super::ranker::{ScoredChunk, rank};
use crate::error::{Result, RetrieverError};
use crate::storage::EmbeddingStore;
use ruborag_embed::EmbeddingProvider;
use tracing::debug;

/// Default number of results returned by a search.
pub const DEFAULT_TOP_K: usize = 5;

/// Parameters of a single search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchOptions {
    pub top_k: usize,
    /// Drop results scoring below this
    pub threshold: Option<f32>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            threshold: None,
        }
    }
}

/// Embeds `query` and returns the best matching stored chunks.
///
/// # Errors
/// [`RetrieverError::NothingToSearch`] when the store is empty, before the
/// query is sent to the gateway.
pub async fn search(
    provider: &dyn EmbeddingProvider,
    store: &dyn EmbeddingStore,
    query: &str,
    options: SearchOptions,
) -> Result<Vec<ScoredChunk>> {
    let records = store.scan_all().await?;
    if records.is_empty() {
        return Err(RetrieverError::NothingToSearch);
    }

    let query_vector = provider.embed_text(query).await?;
    debug!(
        "Ranking {} records against a {}-dimensional query",
        records.len(),
        query_vector.len()
    );

    Ok(rank(&query_vector, &records, options.top_k, options.threshold))
}

/// Looks up the text of each hit, in order.
pub async fn with_content(
    store: &dyn EmbeddingStore,
    hits: Vec<ScoredChunk>,
) -> Result<Vec<(ScoredChunk, Option<String>)>> {
    let mut results = Vec::with_capacity(hits.len());
    for hit in hits {
        let content = store.stored_content(&hit.source_id, hit.chunk_index).await?;
        results.push((hit, content));
    }
    Ok(results)
}


use serde::Serialize;
use tracing::debug;

use super::store::{SearchResult, VectorStore};
use crate::embeddings::engine::{EmbeddingEngine, EmbeddingError};

pub const DEFAULT_TOP_K: usize = 3;

/// Context assembled from the chunks nearest to a query
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RetrievedContext {
    /// Ranked chunk texts, `Document N: ...` per chunk
    pub context: String,
    /// Distinct source filenames in first-seen order
    pub sources: Vec<String>,
}

impl RetrievedContext {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.context.is_empty()
    }
}

/// Label each result with its 1-based rank and collect distinct sources
#[inline]
pub fn assemble_context(results: &[SearchResult]) -> RetrievedContext {
    let mut retrieved = RetrievedContext::default();

    for (rank, result) in results.iter().enumerate() {
        retrieved.context.push_str("Document ");
        retrieved.context.push_str(&(rank + 1).to_string());
        retrieved.context.push_str(": ");
        retrieved.context.push_str(&result.text);
        retrieved.context.push_str("\n\n");

        if !retrieved.sources.contains(&result.metadata.filename) {
            retrieved.sources.push(result.metadata.filename.clone());
        }
    }

    retrieved
}

/// Embed `query` and gather the `k` nearest chunks.
///
/// An unfitted engine or an empty store yields an empty context.
#[inline]
pub fn retrieve(
    engine: &EmbeddingEngine,
    store: &VectorStore,
    query: &str,
    k: usize,
) -> Result<RetrievedContext, EmbeddingError> {
    if !engine.is_fitted() || store.is_empty() {
        return Ok(RetrievedContext::default());
    }

    let embedding = engine.embed_query(query)?;
    let results = store.query(&embedding, k);

    debug!(
        "Retrieved {} chunks for query (nearest distance {:?})",
        results.len(),
        results.first().map(|r| r.distance)
    );

    Ok(assemble_context(&results))
}

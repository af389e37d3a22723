#[cfg(test)]
mod tests;

use std::sync::Arc;

use itertools::Itertools;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use super::composer::compose;
use super::retrieval::retrieve;
use super::store::{ChunkMetadata, VectorStore};
use crate::Result;
use crate::config::{Config, RetrievalConfig};
use crate::embeddings::chunking::{ChunkingConfig, chunk_text};
use crate::embeddings::engine::EmbeddingEngine;
use crate::extract::{FileKind, extract_text};
use crate::generation::GenerationBackend;

pub const NO_DOCUMENTS_NOTICE: &str =
    "⚠️ No documents uploaded yet. Please upload some documents first to enable RAG search!";

const PREVIEW_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadSummary {
    pub message: String,
    pub chunks_created: usize,
    pub filename: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatReply {
    pub response: String,
    pub sources: Vec<String>,
}

/// One entry per uploaded file, previewing its first chunk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentInfo {
    pub id: String,
    pub filename: String,
    pub content_preview: String,
}

/// Corpus, embedding model and store, always mutated together
#[derive(Debug)]
struct RagState {
    corpus: Vec<String>,
    engine: EmbeddingEngine,
    store: VectorStore,
}

impl RagState {
    fn new(dimension: usize) -> Self {
        Self {
            corpus: Vec::new(),
            engine: EmbeddingEngine::new(dimension),
            store: VectorStore::new(dimension),
        }
    }

    /// Insert under the new fit and recompute every older embedding with it.
    ///
    /// Works on a copy of the store so a failure leaves the live one untouched.
    fn reembed_and_insert(
        &mut self,
        engine: &EmbeddingEngine,
        ids: Vec<String>,
        embeddings: Vec<Vec<f32>>,
        texts: Vec<String>,
        metadatas: Vec<ChunkMetadata>,
    ) -> Result<()> {
        let mut store = self.store.clone();
        store.insert(ids, embeddings, texts, metadatas)?;

        let refreshed = store
            .list_all()
            .iter()
            .map(|chunk| engine.embed(&chunk.text))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        store.replace_embeddings(refreshed)?;
        debug!("Re-embedded {} stored chunks", store.len());

        self.store = store;
        Ok(())
    }
}

/// Shared retrieval state plus the optional generation backend
pub struct RagService {
    state: RwLock<RagState>,
    backend: Option<Arc<dyn GenerationBackend>>,
    chunking: ChunkingConfig,
    retrieval: RetrievalConfig,
}

/// First 200 characters, with `...` appended when the text is longer
#[inline]
pub fn content_preview(text: &str) -> String {
    let mut chars = text.chars();
    let preview = chars.by_ref().take(PREVIEW_CHARS).collect::<String>();
    if chars.next().is_some() {
        preview + "..."
    } else {
        preview
    }
}

fn chunk_id(filename: &str, index: usize) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}_{}_{}", filename, index, suffix.get(..8).unwrap_or(&suffix))
}

impl RagService {
    #[inline]
    pub fn new(
        chunking: ChunkingConfig,
        retrieval: RetrievalConfig,
        backend: Option<Arc<dyn GenerationBackend>>,
    ) -> Self {
        Self {
            state: RwLock::new(RagState::new(retrieval.embedding_dimension)),
            backend,
            chunking,
            retrieval,
        }
    }

    #[inline]
    pub fn from_config(config: &Config, backend: Option<Arc<dyn GenerationBackend>>) -> Self {
        Self::new(config.chunking, config.retrieval, backend)
    }

    /// Number of chunk texts the embedding model is trained on
    #[inline]
    pub async fn corpus_len(&self) -> usize {
        self.state.read().await.corpus.len()
    }

    #[inline]
    pub async fn chunk_count(&self) -> usize {
        self.state.read().await.store.len()
    }

    /// Extract, chunk, embed and store an uploaded file
    #[inline]
    pub async fn upload(&self, filename: &str, bytes: Vec<u8>) -> Result<UploadSummary> {
        let kind = FileKind::from_filename(filename)?;
        let text = tokio::task::spawn_blocking(move || extract_text(kind, &bytes))
            .await
            .map_err(|e| anyhow::anyhow!("Extraction task failed: {}", e))??;

        self.ingest_text(filename, &text).await
    }

    /// Chunk, embed and store already extracted text.
    ///
    /// The refit and the insert happen under one write lock and are committed
    /// only if both succeed.
    #[inline]
    pub async fn ingest_text(&self, filename: &str, text: &str) -> Result<UploadSummary> {
        let chunks = chunk_text(text, &self.chunking)?;
        let chunks_created = chunks.len();

        let ids = (0..chunks_created)
            .map(|i| chunk_id(filename, i))
            .collect::<Vec<_>>();
        let metadatas = (0..chunks_created)
            .map(|chunk_index| ChunkMetadata {
                filename: filename.to_string(),
                chunk_index,
            })
            .collect::<Vec<_>>();

        let mut state = self.state.write().await;
        let previous_len = state.corpus.len();
        state.corpus.extend(chunks.iter().cloned());

        let mut engine = state.engine.clone();
        let embeddings = engine.fit_and_embed(&chunks, &state.corpus);

        let stored = if self.retrieval.reembed_on_refit {
            state.reembed_and_insert(&engine, ids, embeddings, chunks, metadatas)
        } else {
            state
                .store
                .insert(ids, embeddings, chunks, metadatas)
                .map_err(Into::into)
        };

        if let Err(e) = stored {
            state.corpus.truncate(previous_len);
            return Err(e);
        }
        state.engine = engine;

        info!(
            "Processed {}: {} chunks, {} total documents",
            filename,
            chunks_created,
            state.corpus.len()
        );

        Ok(UploadSummary {
            message: format!("Successfully uploaded and processed {}", filename),
            chunks_created,
            filename: filename.to_string(),
        })
    }

    /// Answer a message, with retrieval when `use_rag` is set
    #[inline]
    pub async fn chat(&self, message: &str, use_rag: bool) -> Result<ChatReply> {
        let retrieved = {
            let state = self.state.read().await;
            if state.corpus.is_empty() {
                return Ok(ChatReply {
                    response: NO_DOCUMENTS_NOTICE.to_string(),
                    sources: Vec::new(),
                });
            }

            if use_rag && state.engine.is_fitted() {
                Some(retrieve(
                    &state.engine,
                    &state.store,
                    message,
                    self.retrieval.top_k,
                )?)
            } else {
                None
            }
        };

        let (context, sources) =
            retrieved.map_or_else(Default::default, |r| (r.context, r.sources));

        let answer = compose(self.backend.as_deref(), message, &context).await;
        debug!(
            "Answered with {} sources (generated: {})",
            sources.len(),
            answer.is_generated()
        );

        Ok(ChatReply {
            response: answer.to_string(),
            sources,
        })
    }

    /// One entry per distinct filename, in upload order
    #[inline]
    pub async fn documents(&self) -> Vec<DocumentInfo> {
        let state = self.state.read().await;

        state
            .store
            .list_all()
            .iter()
            .unique_by(|chunk| chunk.metadata.filename.as_str())
            .map(|chunk| DocumentInfo {
                id: chunk.metadata.filename.clone(),
                filename: chunk.metadata.filename.clone(),
                content_preview: content_preview(&chunk.text),
            })
            .collect()
    }

    /// Drop every chunk, the corpus and the fitted model
    #[inline]
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        let removed = state.store.len();
        *state = RagState::new(self.retrieval.embedding_dimension);
        info!("All documents and embeddings cleared ({} chunks)", removed);
    }
}

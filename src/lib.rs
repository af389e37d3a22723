use thiserror::Error;

use crate::embeddings::chunking::ChunkingError;
use crate::embeddings::engine::EmbeddingError;
use crate::extract::ExtractionError;
use crate::rag::store::StoreError;

pub type Result<T> = std::result::Result<T, RagError>;

#[derive(Error, Debug)]
pub enum RagError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Chunking(#[from] ChunkingError),

    #[error("Vector store error: {0}")]
    Store(#[from] StoreError),

    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl RagError {
    /// Errors caused by the uploaded content rather than the server
    #[inline]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Extraction(_) | Self::Chunking(_))
    }
}

pub mod commands;
pub mod config;
pub mod embeddings;
pub mod extract;
pub mod generation;
pub mod rag;
pub mod server;

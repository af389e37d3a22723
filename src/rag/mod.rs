// Retrieval-augmented generation pipeline
// Store, retrieval and answer composition, tied together by RagService

pub mod composer;
pub mod retrieval;
pub mod service;
pub mod store;

pub use composer::{Answer, compose};
pub use retrieval::{RetrievedContext, retrieve};
pub use service::{ChatReply, DocumentInfo, RagService, UploadSummary};
pub use store::{ChunkMetadata, SearchResult, StoredChunk, VectorStore};

// Embeddings module
// Word-window chunking and the TF-IDF lexical embedding engine

pub mod chunking;
pub mod engine;
pub mod tfidf;

pub use chunking::{ChunkingConfig, ChunkingError, chunk_text};
pub use engine::{DEFAULT_EMBEDDING_DIMENSION, EmbeddingEngine, EmbeddingError, normalize_width};
pub use tfidf::{FittedTfidf, TfidfVectorizer};

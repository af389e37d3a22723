
use thiserror::Error;
use tracing::debug;

use super::tfidf::{FittedTfidf, TfidfVectorizer};

pub const DEFAULT_EMBEDDING_DIMENSION: usize = 500;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EmbeddingError {
    #[error("Embedding model has not been fitted; upload a document first")]
    NotFitted,
}

/// Pad with zeros or truncate so the vector is exactly `target` wide.
///
/// Both document and query embeddings pass through here, which keeps every
/// vector comparable no matter how large the fitted vocabulary is.
#[inline]
pub fn normalize_width(mut vector: Vec<f32>, target: usize) -> Vec<f32> {
    vector.resize(target, 0.0);
    vector
}

/// Lexical embedding model refitted over the whole corpus on every ingest
#[derive(Debug, Clone)]
pub struct EmbeddingEngine {
    vectorizer: TfidfVectorizer,
    dimension: usize,
    fitted: Option<FittedTfidf>,
}

impl Default for EmbeddingEngine {
    #[inline]
    fn default() -> Self {
        Self::new(DEFAULT_EMBEDDING_DIMENSION)
    }
}

impl EmbeddingEngine {
    /// The vocabulary is capped at `dimension` terms
    #[inline]
    pub fn new(dimension: usize) -> Self {
        Self {
            vectorizer: TfidfVectorizer::new(dimension),
            dimension,
            fitted: None,
        }
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    #[inline]
    pub fn vocabulary_size(&self) -> usize {
        self.fitted
            .as_ref()
            .map_or(0, FittedTfidf::vocabulary_size)
    }

    /// Refit on `full_corpus` and embed only `new_chunks`.
    ///
    /// A corpus whose tokens are all stop words still counts as fitted; its
    /// embeddings are all zeros.
    #[inline]
    pub fn fit_and_embed<S: AsRef<str>>(
        &mut self,
        new_chunks: &[S],
        full_corpus: &[S],
    ) -> Vec<Vec<f32>> {
        let fitted = self
            .vectorizer
            .fit(full_corpus)
            .unwrap_or_else(|| FittedTfidf::empty(full_corpus.len()));

        let embeddings = new_chunks
            .iter()
            .map(|chunk| normalize_width(fitted.transform(chunk.as_ref()), self.dimension))
            .collect::<Vec<_>>();

        debug!(
            "Embeddings shape: ({}, {}) from vocabulary of {} over {} documents",
            embeddings.len(),
            self.dimension,
            fitted.vocabulary_size(),
            fitted.documents_seen()
        );

        self.fitted = Some(fitted);
        embeddings
    }

    /// Embed text with the current fit without changing it
    #[inline]
    pub fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let fitted = self.fitted.as_ref().ok_or(EmbeddingError::NotFitted)?;
        Ok(normalize_width(fitted.transform(text), self.dimension))
    }

    #[inline]
    pub fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let embedding = self.embed(text)?;
        debug!("Query embedding shape: (1, {})", embedding.len());
        Ok(embedding)
    }

    /// Drop the fitted model
    #[inline]
    pub fn reset(&mut self) {
        self.fitted = None;
    }
}

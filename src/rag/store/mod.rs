
use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Metadata stored alongside each chunk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Name of the uploaded file the chunk came from
    pub filename: String,
    /// Position of the chunk within its file
    pub chunk_index: usize,
}

/// A chunk as held by the store
#[derive(Debug, Clone, PartialEq)]
pub struct StoredChunk {
    pub id: String,
    pub text: String,
    pub metadata: ChunkMetadata,
    pub embedding: Vec<f32>,
}

/// Result of a nearest-neighbour query
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub id: String,
    pub text: String,
    pub metadata: ChunkMetadata,
    /// Squared Euclidean distance to the query vector
    pub distance: f32,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Duplicate chunk id: {0}")]
    DuplicateId(String),
    #[error("Vector dimension mismatch for {id}: expected {expected}, got {actual}")]
    DimensionMismatch {
        id: String,
        expected: usize,
        actual: usize,
    },
    #[error(
        "Batch length mismatch: {ids} ids, {vectors} vectors, {texts} texts, {metadatas} metadatas"
    )]
    BatchLengthMismatch {
        ids: usize,
        vectors: usize,
        texts: usize,
        metadatas: usize,
    },
}

/// In-memory vector store with exhaustive nearest-neighbour search
#[derive(Debug, Clone)]
pub struct VectorStore {
    dimension: usize,
    chunks: Vec<StoredChunk>,
    ids: HashSet<String>,
}

#[inline]
pub fn squared_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let diff = x - y;
            diff * diff
        })
        .sum()
}

impl VectorStore {
    #[inline]
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            chunks: Vec::new(),
            ids: HashSet::new(),
        }
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Append a batch of chunks.
    ///
    /// The whole batch is validated first, so a failed insert leaves the store
    /// untouched.
    #[inline]
    pub fn insert(
        &mut self,
        ids: Vec<String>,
        vectors: Vec<Vec<f32>>,
        texts: Vec<String>,
        metadatas: Vec<ChunkMetadata>,
    ) -> Result<(), StoreError> {
        if ids.len() != vectors.len() || ids.len() != texts.len() || ids.len() != metadatas.len()
        {
            return Err(StoreError::BatchLengthMismatch {
                ids: ids.len(),
                vectors: vectors.len(),
                texts: texts.len(),
                metadatas: metadatas.len(),
            });
        }

        let mut batch_ids = HashSet::with_capacity(ids.len());
        for (id, vector) in ids.iter().zip(&vectors) {
            if self.ids.contains(id) || !batch_ids.insert(id.as_str()) {
                return Err(StoreError::DuplicateId(id.clone()));
            }
            if vector.len() != self.dimension {
                return Err(StoreError::DimensionMismatch {
                    id: id.clone(),
                    expected: self.dimension,
                    actual: vector.len(),
                });
            }
        }

        let inserted = ids.len();
        for (((id, embedding), text), metadata) in
            ids.into_iter().zip(vectors).zip(texts).zip(metadatas)
        {
            self.ids.insert(id.clone());
            self.chunks.push(StoredChunk {
                id,
                text,
                metadata,
                embedding,
            });
        }

        debug!(
            "Inserted {} chunks, store now holds {}",
            inserted,
            self.chunks.len()
        );
        Ok(())
    }

    /// The `k` chunks closest to `vector`, nearest first.
    ///
    /// Equal distances keep insertion order.
    #[inline]
    pub fn query(&self, vector: &[f32], k: usize) -> Vec<SearchResult> {
        let mut scored = self
            .chunks
            .iter()
            .map(|chunk| (squared_distance(&chunk.embedding, vector), chunk))
            .collect::<Vec<_>>();
        scored.sort_by(|(a, _), (b, _)| a.total_cmp(b));

        scored
            .into_iter()
            .take(k)
            .map(|(distance, chunk)| SearchResult {
                id: chunk.id.clone(),
                text: chunk.text.clone(),
                metadata: chunk.metadata.clone(),
                distance,
            })
            .collect()
    }

    /// Every chunk in insertion order
    #[inline]
    pub fn list_all(&self) -> &[StoredChunk] {
        &self.chunks
    }

    /// Overwrite every stored embedding, in insertion order
    #[inline]
    pub fn replace_embeddings(&mut self, vectors: Vec<Vec<f32>>) -> Result<(), StoreError> {
        if vectors.len() != self.chunks.len() {
            return Err(StoreError::BatchLengthMismatch {
                ids: self.chunks.len(),
                vectors: vectors.len(),
                texts: self.chunks.len(),
                metadatas: self.chunks.len(),
            });
        }
        if let Some((chunk, vector)) = self
            .chunks
            .iter()
            .zip(&vectors)
            .find(|(_, v)| v.len() != self.dimension)
        {
            return Err(StoreError::DimensionMismatch {
                id: chunk.id.clone(),
                expected: self.dimension,
                actual: vector.len(),
            });
        }

        for (chunk, vector) in self.chunks.iter_mut().zip(vectors) {
            chunk.embedding = vector;
        }
        Ok(())
    }

    #[inline]
    pub fn clear(&mut self) {
        self.chunks.clear();
        self.ids.clear();
    }
}

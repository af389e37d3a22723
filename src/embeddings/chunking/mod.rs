#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_CHUNK_SIZE: usize = 500;
pub const DEFAULT_CHUNK_OVERLAP: usize = 50;

/// Configuration for word-window chunking
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Number of words per chunk
    pub chunk_size: usize,
    /// Number of words shared by consecutive chunks
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    #[inline]
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

impl ChunkingConfig {
    /// Distance in words between the starts of consecutive windows
    #[inline]
    pub fn stride(&self) -> Result<usize, ChunkingError> {
        if self.chunk_size == 0 || self.overlap >= self.chunk_size {
            return Err(ChunkingError::InvalidWindow {
                chunk_size: self.chunk_size,
                overlap: self.overlap,
            });
        }
        Ok(self.chunk_size - self.overlap)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChunkingError {
    #[error("No text content found in the document")]
    EmptyDocument,
    #[error("Invalid chunk window: overlap ({overlap}) must be smaller than chunk size ({chunk_size})")]
    InvalidWindow { chunk_size: usize, overlap: usize },
}

/// Split text into overlapping windows of whitespace-separated words.
///
/// A window starts at every multiple of the stride below the word count, so the
/// tail of the document may produce a short window that lies entirely inside
/// its predecessor.
#[inline]
pub fn chunk_text(text: &str, config: &ChunkingConfig) -> Result<Vec<String>, ChunkingError> {
    let stride = config.stride()?;
    let words = text.split_whitespace().collect::<Vec<_>>();

    let chunks = (0..words.len())
        .step_by(stride)
        .map(|start| {
            let end = start.saturating_add(config.chunk_size).min(words.len());
            words[start..end].join(" ")
        })
        .filter(|chunk| !chunk.trim().is_empty())
        .collect::<Vec<_>>();

    if chunks.is_empty() {
        return Err(ChunkingError::EmptyDocument);
    }

    debug!(
        "Chunked {} words into {} chunks (size {}, overlap {})",
        words.len(),
        chunks.len(),
        config.chunk_size,
        config.overlap
    );

    Ok(chunks)
}

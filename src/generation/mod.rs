// Generation backends
// Text generation is best-effort: callers fall back to search-only answers on any error

pub mod ollama;

use async_trait::async_trait;
use thiserror::Error;

pub use ollama::{ModelInfo, OllamaClient};

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Generation backend unavailable: {0}")]
    Unavailable(String),
    #[error("Generation backend timed out")]
    Timeout,
    #[error("Generation backend returned HTTP {0}")]
    Status(u16),
    #[error("Invalid response from generation backend: {0}")]
    InvalidResponse(String),
}

/// A service that turns a prompt into text
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

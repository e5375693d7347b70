// Embeddings module
// Word-window chunking plus the embedding collaborator and its Ollama implementation

pub mod chunking;
pub mod ollama;

use async_trait::async_trait;
use thiserror::Error;

pub use chunking::{ChunkingConfig, ChunkingError, chunk_spans, chunk_text};
pub use ollama::OllamaClient;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("Embedding service unavailable: {0}")]
    Unavailable(String),
    #[error("Embedding request failed: {0}")]
    Request(String),
    #[error("Embedder returned {actual} vectors for {expected} inputs")]
    CountMismatch { expected: usize, actual: usize },
}

/// Maps text to fixed-dimension vectors.
///
/// Implementations must return exactly one vector per input or an error; they never
/// substitute placeholder vectors for inputs they failed to embed.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Length of every vector this embedder produces
    fn dimension(&self) -> usize;
}

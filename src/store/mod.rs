// Vector store module
// Exact nearest-neighbor index over chunk embeddings with persisted metadata

mod persistence;
pub mod vector_store;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use vector_store::VectorStore;

/// Metadata for a chunk stored alongside its embedding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Human-readable label of the source document, usually its file name
    pub source: String,
    /// Identifier of the document this chunk was cut from
    pub doc_id: String,
    /// Position of this chunk among the chunks of its document
    pub chunk_index: usize,
    /// The literal chunk text
    pub text: String,
    /// When the chunk was indexed
    pub indexed_at: DateTime<Utc>,
}

impl ChunkMetadata {
    #[inline]
    pub fn new(
        source: impl Into<String>,
        doc_id: impl Into<String>,
        chunk_index: usize,
        text: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            doc_id: doc_id.into(),
            chunk_index,
            text: text.into(),
            indexed_at: Utc::now(),
        }
    }
}

/// One index entry; the vector and its metadata always travel together
#[derive(Debug, Clone, PartialEq)]
pub struct StoredChunk {
    pub vector: Vec<f32>,
    pub metadata: ChunkMetadata,
}

/// Search result from a nearest-neighbor query
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub chunk_metadata: ChunkMetadata,
    /// Squared Euclidean distance to the query vector; smaller is closer
    pub distance: f32,
}

/// Number of chunks indexed from one source label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSummary {
    pub source: String,
    pub chunk_count: usize,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Vector dimension mismatch: store expects {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("Misaligned batch: {vectors} vectors but {metadata} metadata records")]
    MisalignedBatch { vectors: usize, metadata: usize },
    #[error("Vector store dimension must be greater than zero")]
    ZeroDimension,
    #[error("Persisted vector store is corrupt: {0}")]
    Corrupt(String),
    #[error("Metadata serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

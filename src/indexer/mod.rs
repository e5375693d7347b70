// Indexer module
// Turns documents into chunk embeddings and upserts them into the vector store


use std::collections::HashSet;
use std::path::Path;
use std::slice;
use std::sync::Arc;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::Result;
use crate::embeddings::{ChunkingConfig, Embedder, EmbeddingError};
use crate::store::{ChunkMetadata, VectorStore};

/// A document handed to the indexer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: String,
    pub text: String,
    /// Human-readable label, usually the file name
    pub source: String,
}

impl Document {
    /// Create a document with a fresh random identifier
    #[inline]
    pub fn new(text: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: text.into(),
            source: source.into(),
        }
    }
}

/// What to do when the embedder fails on a batch of chunks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingFailurePolicy {
    /// Propagate the error; nothing is stored
    #[default]
    FailBatch,
    /// Retry chunk by chunk and drop the chunks that still fail
    SkipFailed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexingConfig {
    /// Skip documents whose source label is already in the store or earlier in the batch
    pub skip_existing_sources: bool,
    pub embedding_failure_policy: EmbeddingFailurePolicy,
}

/// Statistics about one indexing run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexingStats {
    pub documents_indexed: usize,
    pub documents_skipped: usize,
    pub chunks_created: usize,
    pub embeddings_stored: usize,
    pub chunks_failed: usize,
}

/// Chunks, embeds and stores documents
pub struct Indexer {
    embedder: Arc<dyn Embedder>,
    chunking: ChunkingConfig,
    config: IndexingConfig,
}

impl Indexer {
    #[inline]
    pub fn new(embedder: Arc<dyn Embedder>, chunking: ChunkingConfig, config: IndexingConfig) -> Self {
        Self {
            embedder,
            chunking,
            config,
        }
    }

    /// Index `documents` into `store`.
    ///
    /// All chunks of all documents are embedded together, then added to the store in a
    /// single mutation. On error the store is left as it was.
    #[inline]
    pub async fn index_documents(
        &self,
        documents: &[Document],
        store: &mut VectorStore,
    ) -> Result<IndexingStats> {
        let mut stats = IndexingStats::default();
        let mut texts = Vec::new();
        let mut metadata = Vec::new();
        let mut accepted_sources: HashSet<&str> = HashSet::new();

        for document in documents {
            if self.config.skip_existing_sources
                && (store.contains_source(&document.source)
                    || !accepted_sources.insert(document.source.as_str()))
            {
                info!("Skipping already indexed source: {}", document.source);
                stats.documents_skipped += 1;
                continue;
            }

            let chunks = self.chunking.chunk(&document.text)?;
            debug!("Document {} produced {} chunks", document.source, chunks.len());

            stats.documents_indexed += 1;
            stats.chunks_created += chunks.len();

            for (chunk_index, chunk) in chunks.into_iter().enumerate() {
                metadata.push(ChunkMetadata::new(
                    &document.source,
                    &document.id,
                    chunk_index,
                    chunk.as_str(),
                ));
                texts.push(chunk);
            }
        }

        if texts.is_empty() {
            debug!("No chunks to embed");
            return Ok(stats);
        }

        let (vectors, metadata) = match self.config.embedding_failure_policy {
            EmbeddingFailurePolicy::FailBatch => {
                let vectors = self.embedder.embed(&texts).await?;
                if !vectors.is_empty() && vectors.len() != texts.len() {
                    return Err(EmbeddingError::CountMismatch {
                        expected: texts.len(),
                        actual: vectors.len(),
                    }
                    .into());
                }
                (vectors, metadata)
            }
            EmbeddingFailurePolicy::SkipFailed => {
                self.embed_skipping_failures(&texts, metadata, &mut stats)
                    .await
            }
        };

        if vectors.is_empty() {
            warn!("Embedder returned no vectors; nothing stored");
            return Ok(stats);
        }

        let stored = vectors.len();
        store.add(vectors, metadata)?;
        stats.embeddings_stored = stored;

        info!(
            "Indexed {} documents: {} chunks created, {} embeddings stored, {} failed",
            stats.documents_indexed, stats.chunks_created, stats.embeddings_stored, stats.chunks_failed
        );

        Ok(stats)
    }

    async fn embed_skipping_failures(
        &self,
        texts: &[String],
        metadata: Vec<ChunkMetadata>,
        stats: &mut IndexingStats,
    ) -> (Vec<Vec<f32>>, Vec<ChunkMetadata>) {
        match self.embedder.embed(texts).await {
            Ok(vectors) if vectors.len() == texts.len() => return (vectors, metadata),
            Ok(vectors) if vectors.is_empty() => return (vectors, Vec::new()),
            Ok(vectors) => warn!(
                "Embedder returned {} vectors for {} chunks; retrying one at a time",
                vectors.len(),
                texts.len()
            ),
            Err(e) => warn!("Batch embedding failed: {}; retrying one at a time", e),
        }

        let mut kept_vectors = Vec::with_capacity(texts.len());
        let mut kept_metadata = Vec::with_capacity(texts.len());

        for (text, meta) in texts.iter().zip(metadata) {
            match self.embedder.embed(slice::from_ref(text)).await {
                Ok(mut vectors) if vectors.len() == 1 => {
                    if let Some(vector) = vectors.pop() {
                        kept_vectors.push(vector);
                        kept_metadata.push(meta);
                    }
                }
                Ok(vectors) => {
                    warn!(
                        "Dropping chunk {} of {}: embedder returned {} vectors",
                        meta.chunk_index,
                        meta.source,
                        vectors.len()
                    );
                    stats.chunks_failed += 1;
                }
                Err(e) => {
                    warn!(
                        "Dropping chunk {} of {}: {}",
                        meta.chunk_index, meta.source, e
                    );
                    stats.chunks_failed += 1;
                }
            }
        }

        (kept_vectors, kept_metadata)
    }
}

/// Read a text file into a [`Document`].
///
/// Bytes that are not valid UTF-8 are decoded as Latin-1.
#[inline]
pub async fn load_document(path: impl AsRef<Path>) -> Result<Document> {
    let path = path.as_ref();
    let source = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .with_context(|| format!("Path has no file name: {}", path.display()))?;

    let bytes = tokio::fs::read(path).await?;
    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            debug!("{} is not valid UTF-8, decoding as Latin-1", source);
            e.into_bytes().into_iter().map(char::from).collect()
        }
    };

    Ok(Document::new(text, source))
}

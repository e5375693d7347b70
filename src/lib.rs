use thiserror::Error;

pub type Result<T> = std::result::Result<T, RagError>;

#[derive(Error, Debug)]
pub enum RagError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Chunking error: {0}")]
    Chunking(#[from] embeddings::chunking::ChunkingError),

    #[error("Vector store error: {0}")]
    Store(#[from] store::StoreError),

    #[error("Embedding error: {0}")]
    Embedding(#[from] embeddings::EmbeddingError),

    #[error("Language model error: {0}")]
    Llm(#[from] llm::LlmError),

    #[error("Web search error: {0}")]
    WebSearch(#[from] web::WebSearchError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod commands;
pub mod config;
pub mod embeddings;
mod http;
pub mod indexer;
pub mod llm;
pub mod retrieval;
pub mod store;
pub mod web;

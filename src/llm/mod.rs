// Language model module
// Completion collaborator used for web summaries and final answers

pub mod groq;

use async_trait::async_trait;
use thiserror::Error;

pub use groq::GroqClient;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Language model API key is not configured")]
    MissingApiKey,
    #[error("Language model request failed: {0}")]
    Request(String),
    #[error("Language model returned no completion")]
    EmptyResponse,
}

/// Text completion: prompt in, text out
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, LlmError>;
}

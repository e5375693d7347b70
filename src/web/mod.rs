// Web search module
// Optional live search collaborator and LLM summarization of its hits

pub mod serpapi;


use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::llm::{LanguageModel, LlmError};

pub use serpapi::SerpApiClient;

pub const SUMMARY_MAX_TOKENS: u32 = 200;
pub const SUMMARY_TEMPERATURE: f32 = 0.0;
const SUMMARY_INSTRUCTION: &str = "Summarize the search results below in 3–4 sentences:\n\n";

/// One organic search result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebHit {
    pub title: String,
    pub snippet: String,
    pub link: String,
}

#[derive(Debug, Error)]
pub enum WebSearchError {
    #[error("Web search API key is not configured")]
    MissingApiKey,
    #[error("Web search request failed: {0}")]
    Request(String),
}

/// Live web search: query in, hits out
#[async_trait]
pub trait WebSearch: Send + Sync {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<WebHit>, WebSearchError>;
}

/// Prompt asking the language model to condense `hits` into a few sentences
#[inline]
pub fn summary_prompt(hits: &[WebHit]) -> String {
    hits.iter().fold(SUMMARY_INSTRUCTION.to_string(), |mut prompt, hit| {
        prompt.push_str("- ");
        prompt.push_str(&hit.title);
        prompt.push_str(" → ");
        prompt.push_str(&hit.snippet);
        prompt.push('\n');
        prompt
    })
}

/// Summarize search hits with the language model; no hits means an empty summary
#[inline]
pub async fn summarize_hits(hits: &[WebHit], llm: &dyn LanguageModel) -> Result<String, LlmError> {
    if hits.is_empty() {
        return Ok(String::new());
    }

    debug!("Summarizing {} web hits", hits.len());
    llm.complete(&summary_prompt(hits), SUMMARY_MAX_TOKENS, SUMMARY_TEMPERATURE)
        .await
}

// Retrieval module
// Combines vector search over indexed documents with an optional web summary

pub mod prompt;

#[cfg(test)]
mod tests;

use std::slice;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::Result;
use crate::embeddings::Embedder;
use crate::llm::LanguageModel;
use crate::store::{SearchResult, StoreError, VectorStore};
use crate::web::{WebSearch, summarize_hits};

pub use prompt::{ResponseMode, build_answer_prompt, format_document_context};

pub const DEFAULT_MAX_WEB_RESULTS: usize = 4;
pub const ANSWER_MAX_TOKENS: u32 = 600;

/// Grounding context gathered for one query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnswerContext {
    pub retrieved: Vec<SearchResult>,
    /// LLM summary of live web results; empty when unused or unavailable
    pub web_summary: String,
}

/// Retrieval orchestrator.
///
/// Collaborator failures degrade to empty context instead of failing the query. Only
/// structural store errors propagate.
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    llm: Arc<dyn LanguageModel>,
    web_search: Option<Arc<dyn WebSearch>>,
    max_web_results: usize,
    answer_max_tokens: u32,
}

impl Retriever {
    #[inline]
    pub fn new(embedder: Arc<dyn Embedder>, llm: Arc<dyn LanguageModel>) -> Self {
        Self {
            embedder,
            llm,
            web_search: None,
            max_web_results: DEFAULT_MAX_WEB_RESULTS,
            answer_max_tokens: ANSWER_MAX_TOKENS,
        }
    }

    #[inline]
    pub fn with_web_search(mut self, web_search: Arc<dyn WebSearch>, max_results: usize) -> Self {
        self.web_search = Some(web_search);
        self.max_web_results = max_results;
        self
    }

    /// Token limit for the final answer
    #[inline]
    pub fn with_answer_max_tokens(mut self, max_tokens: u32) -> Self {
        self.answer_max_tokens = max_tokens;
        self
    }

    /// Gather the top `k` chunks for `query` and, when `use_web` is set, a summary of
    /// live search results. Both run concurrently.
    #[inline]
    pub async fn answer_context(
        &self,
        query: &str,
        store: &VectorStore,
        k: usize,
        use_web: bool,
    ) -> Result<AnswerContext> {
        let web_branch = async {
            if use_web {
                self.web_summary(query).await
            } else {
                String::new()
            }
        };

        let (retrieved, web_summary) = tokio::join!(self.retrieve(query, store, k), web_branch);
        let retrieved = retrieved?;

        info!(
            "Retrieved {} chunks, web summary {} chars",
            retrieved.len(),
            web_summary.len()
        );

        Ok(AnswerContext {
            retrieved,
            web_summary,
        })
    }

    /// Ask the language model for the final answer
    #[inline]
    pub async fn answer(
        &self,
        query: &str,
        mode: ResponseMode,
        context: &AnswerContext,
        temperature: f32,
    ) -> Result<String> {
        let prompt = build_answer_prompt(query, mode, context);
        debug!("Answer prompt is {} chars", prompt.len());

        Ok(self
            .llm
            .complete(&prompt, self.answer_max_tokens, temperature)
            .await?)
    }

    async fn retrieve(
        &self,
        query: &str,
        store: &VectorStore,
        k: usize,
    ) -> std::result::Result<Vec<SearchResult>, StoreError> {
        let query_text = query.to_string();
        let embedding = match self.embedder.embed(slice::from_ref(&query_text)).await {
            Ok(mut vectors) => match vectors.pop() {
                Some(vector) => vector,
                None => {
                    warn!("Embedder returned no vector for the query; skipping retrieval");
                    return Ok(Vec::new());
                }
            },
            Err(e) => {
                warn!("Failed to embed query, skipping retrieval: {}", e);
                return Ok(Vec::new());
            }
        };

        store.query(&embedding, k)
    }

    async fn web_summary(&self, query: &str) -> String {
        let Some(web_search) = &self.web_search else {
            debug!("Web search requested but no provider is configured");
            return String::new();
        };

        let hits = match web_search.search(query, self.max_web_results).await {
            Ok(hits) => hits,
            Err(e) => {
                warn!("Web search failed: {}", e);
                return String::new();
            }
        };

        match summarize_hits(&hits, self.llm.as_ref()).await {
            Ok(summary) => summary,
            Err(e) => {
                warn!("Failed to summarize web results: {}", e);
                String::new()
            }
        }
    }
}


use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::{WebHit, WebSearch, WebSearchError};
use crate::config::WebSearchConfig;
use crate::http::{build_agent, request_with_retry};

const SEARCH_TIMEOUT_SECONDS: u64 = 10;

/// Google search through SerpAPI
#[derive(Debug, Clone)]
pub struct SerpApiClient {
    base_url: Url,
    engine: String,
    api_key: Option<String>,
    agent: ureq::Agent,
    retry_attempts: u32,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    organic_results: Vec<OrganicResult>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    snippet: String,
    #[serde(default)]
    link: String,
}

impl SerpApiClient {
    #[inline]
    pub fn new(config: &WebSearchConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .with_context(|| format!("Invalid web search URL: {}", config.base_url))?;

        Ok(Self {
            base_url,
            engine: config.engine.clone(),
            api_key: config.usable_api_key().map(str::to_string),
            agent: build_agent(Duration::from_secs(SEARCH_TIMEOUT_SECONDS)),
            retry_attempts: 1,
        })
    }

    #[inline]
    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = attempts;
        self
    }

    #[inline]
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Run a search and keep at most `limit` organic results
    #[inline]
    pub fn search_blocking(&self, query: &str, limit: usize) -> Result<Vec<WebHit>, WebSearchError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(WebSearchError::MissingApiKey);
        };

        let response = self
            .request_search(api_key, query)
            .map_err(|e| WebSearchError::Request(format!("{:#}", e)))?;

        let hits: Vec<WebHit> = response
            .organic_results
            .into_iter()
            .take(limit)
            .map(|result| WebHit {
                title: result.title,
                snippet: result.snippet,
                link: result.link,
            })
            .collect();

        debug!("Web search returned {} hits", hits.len());
        Ok(hits)
    }

    fn request_search(&self, api_key: &str, query: &str) -> Result<SearchResponse> {
        let url = self
            .base_url
            .join("search")
            .context("Failed to build search URL")?;

        let response_text = request_with_retry(url.as_str(), self.retry_attempts, || {
            self.agent
                .get(url.as_str())
                .query("q", query)
                .query("engine", &self.engine)
                .query("api_key", api_key)
                .call()
                .and_then(|mut resp| resp.body_mut().read_to_string())
        })
        .context("Search request failed")?;

        serde_json::from_str(&response_text).context("Failed to parse search response")
    }
}

#[async_trait]
impl WebSearch for SerpApiClient {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<WebHit>, WebSearchError> {
        if !self.is_configured() {
            return Err(WebSearchError::MissingApiKey);
        }

        let client = self.clone();
        let query = query.to_string();
        tokio::task::spawn_blocking(move || client.search_blocking(&query, limit))
            .await
            .map_err(|e| WebSearchError::Request(format!("Search task failed: {}", e)))?
    }
}


use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::{LanguageModel, LlmError};
use crate::config::LlmConfig;
use crate::http::{
    DEFAULT_RETRY_ATTEMPTS, DEFAULT_TIMEOUT_SECONDS, build_agent, request_with_retry,
};

/// Client for Groq's OpenAI-compatible chat completion endpoint
#[derive(Debug, Clone)]
pub struct GroqClient {
    base_url: Url,
    model: String,
    api_key: Option<String>,
    agent: ureq::Agent,
    retry_attempts: u32,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl GroqClient {
    #[inline]
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .with_context(|| format!("Invalid language model URL: {}", config.base_url))?;

        Ok(Self {
            base_url,
            model: config.model.clone(),
            api_key: config.usable_api_key().map(str::to_string),
            agent: build_agent(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS)),
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
        })
    }

    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = build_agent(timeout);
        self
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

    /// Send a single-message chat completion and return the trimmed reply
    #[inline]
    pub fn chat_completion(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, LlmError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(LlmError::MissingApiKey);
        };

        let reply = self
            .request_completion(api_key, prompt, max_tokens, temperature)
            .map_err(|e| LlmError::Request(format!("{:#}", e)))?;

        let reply = reply.ok_or(LlmError::EmptyResponse)?;
        let reply = reply.trim();
        if reply.is_empty() {
            return Err(LlmError::EmptyResponse);
        }

        Ok(reply.to_string())
    }

    fn request_completion(
        &self,
        api_key: &str,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<Option<String>> {
        let url = self
            .base_url
            .join("chat/completions")
            .context("Failed to build chat completion URL")?;

        let request = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens,
            temperature,
        };
        let request_json =
            serde_json::to_string(&request).context("Failed to serialize chat request")?;
        let authorization = format!("Bearer {}", api_key);

        debug!(
            "Requesting completion from {} (prompt length: {})",
            self.model,
            prompt.len()
        );

        let response_text = request_with_retry(url.as_str(), self.retry_attempts, || {
            self.agent
                .post(url.as_str())
                .header("Content-Type", "application/json")
                .header("Authorization", &authorization)
                .send(&request_json)
                .and_then(|mut resp| resp.body_mut().read_to_string())
        })
        .context("Chat completion request failed")?;

        let response: ChatResponse =
            serde_json::from_str(&response_text).context("Failed to parse chat response")?;

        Ok(response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content))
    }
}

#[async_trait]
impl LanguageModel for GroqClient {
    async fn complete(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, LlmError> {
        if !self.is_configured() {
            return Err(LlmError::MissingApiKey);
        }

        let client = self.clone();
        let prompt = prompt.to_string();
        tokio::task::spawn_blocking(move || client.chat_completion(&prompt, max_tokens, temperature))
            .await
            .map_err(|e| LlmError::Request(format!("Completion task failed: {}", e)))?
    }
}

//! Gemini LLM client implementation
//!
//! Async HTTP client for the `generateContent` endpoint. Exactly one request is
//! sent per [`GenerationClient::complete`] call; there is no retry or fallback.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use tracing::{debug, warn};

use crate::config::LlmConfig;
use crate::error::{Error, Result};

use super::GenerationClient;
use super::types::{GenerateRequest, GenerateResponse, GenerationConfig};

/// Gemini REST API base URL
const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Returned when the API answers successfully but without any candidate text
pub const NO_RESPONSE_SENTINEL: &str = "No response generated";

/// Upper bound on how much of an error body is kept in [`Error::Upstream`]
const MAX_ERROR_BODY_LEN: usize = 2000;

/// Gemini LLM client
///
/// Cheap to clone; the underlying connection pool is shared.
#[derive(Clone)]
pub struct GeminiClient {
    /// HTTP client for making requests (carries the per-call timeout)
    http_client: HttpClient,
    /// Model, sampling constants and timeout
    config: LlmConfig,
    /// API key for authentication
    api_key: String,
    /// Base URL for the API
    base_url: String,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("model", &self.config.model)
            .finish()
    }
}

/// Builder for creating a GeminiClient
pub struct GeminiClientBuilder {
    config: Option<LlmConfig>,
    api_key: Option<String>,
    base_url: Option<String>,
    timeout_secs: Option<u64>,
}

impl Default for GeminiClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GeminiClientBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            config: None,
            api_key: None,
            base_url: None,
            timeout_secs: None,
        }
    }

    /// Set the LLM configuration
    pub fn config(mut self, config: LlmConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the API key
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Override the base URL (defaults to the configured one)
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the per-call timeout
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Build the GeminiClient
    pub fn build(self) -> Result<GeminiClient> {
        let config = self.config.unwrap_or_default();
        let api_key = self
            .api_key
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| Error::ConfigError("API key is required".to_string()))?;

        let timeout_secs = self.timeout_secs.unwrap_or(config.timeout_secs);

        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(Error::transport)?;

        let base_url = self
            .base_url
            .or_else(|| Some(config.base_url.clone()).filter(|url| !url.is_empty()))
            .unwrap_or_else(|| GEMINI_BASE_URL.to_string());

        Ok(GeminiClient {
            http_client,
            config,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

impl GeminiClient {
    /// Create a new GeminiClient with the given configuration and API key
    pub fn new(config: LlmConfig, api_key: impl Into<String>) -> Result<Self> {
        GeminiClientBuilder::new()
            .config(config)
            .api_key(api_key)
            .build()
    }

    /// Create a client from configuration, reading the API key from the environment
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let api_key = config
            .resolved_api_key()
            .map_err(|e| Error::ConfigError(e.to_string()))?
            .ok_or_else(|| {
                Error::ConfigError(
                    "No API key found. Set HACKMATE_API_KEY or GEMINI_API_KEY.".to_string(),
                )
            })?;
        Self::new(config.clone(), api_key)
    }

    /// Create a new builder for GeminiClient
    pub fn builder() -> GeminiClientBuilder {
        GeminiClientBuilder::new()
    }

    /// Sampling parameters sent with every request
    pub fn generation_config(&self, max_tokens: u32) -> GenerationConfig {
        GenerationConfig {
            max_output_tokens: max_tokens,
            temperature: self.config.temperature,
            top_p: self.config.top_p,
            top_k: self.config.top_k,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url, self.config.model
        )
    }

    /// Send a single request to the API
    async fn send_request(&self, request: &GenerateRequest) -> Result<String> {
        debug!(
            model = %self.config.model,
            max_tokens = request.generation_config.max_output_tokens,
            "Sending generateContent request"
        );

        let response = self
            .http_client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(request)
            .send()
            .await
            .map_err(|e| Error::transport(e.without_url()))?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Generation request rejected");
            return Err(Error::Upstream {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let generated: GenerateResponse = response
            .json()
            .await
            .map_err(|e| {
                Error::transport(format!("Failed to parse response: {}", e.without_url()))
            })?;

        Ok(text_or_sentinel(&generated))
    }
}

#[async_trait]
impl GenerationClient for GeminiClient {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        let request = GenerateRequest::new(prompt, self.generation_config(max_tokens));
        self.send_request(&request).await
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

/// First candidate's text, or the sentinel when there is none
fn text_or_sentinel(response: &GenerateResponse) -> String {
    response
        .first_text()
        .unwrap_or(NO_RESPONSE_SENTINEL)
        .to_string()
}

fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_LEN {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY_LEN;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

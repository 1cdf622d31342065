//! LLM integration - Gemini `generateContent` API
//!
//! This module provides:
//! - The [`GenerationClient`] capability every agent calls through
//! - A Gemini HTTP client implementing it
//! - Request/response types matching the Gemini REST format

mod client;
mod types;

use async_trait::async_trait;

use crate::error::Result;

pub use client::{GeminiClient, GeminiClientBuilder, NO_RESPONSE_SENTINEL};
pub use types::{
    Candidate, Content, GenerateRequest, GenerateResponse, GenerationConfig, Part,
};

/// A single-shot text completion backend
///
/// Implementations send exactly one upstream request per call. Non-2xx
/// responses surface as [`crate::Error::Upstream`], everything else that goes
/// wrong on the wire as [`crate::Error::Transport`].
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Complete `prompt`, producing at most `max_tokens` output tokens
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String>;

    /// Model identifier, for logs
    fn model(&self) -> &str;
}

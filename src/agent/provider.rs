//! Pluggable LLM provider trait.
//!
//! Implementations translate provider-agnostic [`ChatRequest`]/[`ChatResponse`]
//! into a vendor SDK call, keeping the generation protocol independent of
//! any particular backend.

use async_trait::async_trait;

use super::message::{ChatRequest, ChatResponse};
use crate::error::GenerationError;

/// A chat-completion backend.
///
/// One call is one request: implementations do not retry, stream, or
/// time out on their own.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name (e.g., `"openai"`).
    fn name(&self) -> &'static str;

    /// Executes a chat completion request.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError`] on transport, API, or decoding failures.
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, GenerationError>;
}

//! Scripted provider shared by unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use super::message::{ChatRequest, ChatResponse, TokenUsage};
use super::provider::LlmProvider;
use super::tool::ToolCall;
use crate::error::GenerationError;

type Scripted = Result<ChatResponse, GenerationError>;

/// Replays queued responses and records every request it receives.
///
/// Once the script runs out it answers with `"fallback answer"`.
#[derive(Clone, Default)]
pub struct ScriptedProvider {
    script: Arc<Mutex<VecDeque<Scripted>>>,
    requests: Arc<Mutex<Vec<ChatRequest>>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then_text(self, text: &str) -> Self {
        self.push(Ok(text_response(text)))
    }

    pub fn then_tool_calls(self, calls: Vec<ToolCall>) -> Self {
        self.push(Ok(ChatResponse {
            content: String::new(),
            usage: usage(10),
            tool_calls: calls,
            finish_reason: Some("tool_calls".to_string()),
        }))
    }

    pub fn then_error(self, message: &str) -> Self {
        self.push(Err(GenerationError::ApiRequest {
            message: message.to_string(),
            status: Some(500),
        }))
    }

    fn push(self, response: Scripted) -> Self {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(response);
        self
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

pub fn usage(total: u32) -> TokenUsage {
    TokenUsage {
        prompt_tokens: total,
        completion_tokens: 0,
        total_tokens: total,
    }
}

pub fn text_response(text: &str) -> ChatResponse {
    ChatResponse {
        content: text.to_string(),
        usage: usage(20),
        tool_calls: Vec::new(),
        finish_reason: Some("stop".to_string()),
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, GenerationError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| Ok(text_response("fallback answer")))
    }
}

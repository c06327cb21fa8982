//! Chat messages exchanged with the generation backend.
//!
//! Messages are request-scoped: the client builds a fresh conversation for
//! every query and drops it once the answer is produced.

use serde::{Deserialize, Serialize};

use super::tool::{ToolCall, ToolDefinition};

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions plus rendered session history.
    System,
    /// The user's question or grounded prompt.
    User,
    /// Model output, possibly carrying tool calls.
    Assistant,
    /// Output of one tool invocation.
    Tool,
}

/// One conversation message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Author.
    pub role: Role,
    /// Text content (may be empty for assistant tool-call turns).
    pub content: String,
    /// Tool invocations requested in an assistant turn.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// Invocation this tool message answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

/// How the model may use the advertised tools.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolChoice {
    /// No tools advertised.
    #[default]
    None,
    /// The model decides whether to call a tool.
    Auto,
}

/// A chat completion request handed to an [`super::LlmProvider`].
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    /// Model identifier.
    pub model: String,
    /// Conversation so far.
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature.
    pub temperature: Option<f32>,
    /// Output token cap.
    pub max_tokens: Option<u32>,
    /// Tool schemas advertised to the model.
    pub tools: Vec<ToolDefinition>,
    /// Tool selection mode; [`ToolChoice::Auto`] whenever `tools` is non-empty.
    pub tool_choice: ToolChoice,
}

/// Token counts reported by the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Prompt tokens.
    pub prompt_tokens: u32,
    /// Completion tokens.
    pub completion_tokens: u32,
    /// Sum of both.
    pub total_tokens: u32,
}

impl TokenUsage {
    /// Adds another request's usage to this one.
    pub const fn accumulate(&mut self, other: Self) {
        self.prompt_tokens = self.prompt_tokens.saturating_add(other.prompt_tokens);
        self.completion_tokens = self
            .completion_tokens
            .saturating_add(other.completion_tokens);
        self.total_tokens = self.total_tokens.saturating_add(other.total_tokens);
    }
}

/// A chat completion response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatResponse {
    /// Generated text; empty when the model only requested tools.
    pub content: String,
    /// Token usage.
    pub usage: TokenUsage,
    /// Tool invocations requested by the model, in emitted order.
    pub tool_calls: Vec<ToolCall>,
    /// Backend finish reason (`"stop"`, `"tool_calls"`, ...).
    pub finish_reason: Option<String>,
}

fn message(role: Role, content: &str) -> ChatMessage {
    ChatMessage {
        role,
        content: content.to_string(),
        tool_calls: Vec::new(),
        tool_call_id: None,
    }
}

/// System message.
#[must_use]
pub fn system_message(content: &str) -> ChatMessage {
    message(Role::System, content)
}

/// User message.
#[must_use]
pub fn user_message(content: &str) -> ChatMessage {
    message(Role::User, content)
}

/// Assistant turn recording the tool calls it made, in order.
#[must_use]
pub fn assistant_tool_calls_message(content: &str, tool_calls: Vec<ToolCall>) -> ChatMessage {
    ChatMessage {
        tool_calls,
        ..message(Role::Assistant, content)
    }
}

/// Tool message answering the invocation `tool_call_id`.
#[must_use]
pub fn tool_message(tool_call_id: &str, content: &str) -> ChatMessage {
    ChatMessage {
        tool_call_id: Some(tool_call_id.to_string()),
        ..message(Role::Tool, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_message_links_call_id() {
        let msg = tool_message("call_7", "[CS101]\nsome text");
        assert_eq!(msg.role, Role::Tool);
        assert_eq!(msg.tool_call_id.as_deref(), Some("call_7"));
    }

    #[test]
    fn test_assistant_message_keeps_call_order() {
        let calls = vec![
            ToolCall::new("a", "search_course_content", "{}"),
            ToolCall::new("b", "get_course_outline", "{}"),
        ];
        let msg = assistant_tool_calls_message("", calls);
        assert_eq!(msg.role, Role::Assistant);
        let ids: Vec<&str> = msg.tool_calls.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_usage_accumulates() {
        let mut usage = TokenUsage {
            prompt_tokens: 10,
            completion_tokens: 2,
            total_tokens: 12,
        };
        usage.accumulate(TokenUsage {
            prompt_tokens: 20,
            completion_tokens: 5,
            total_tokens: 25,
        });
        assert_eq!(usage.total_tokens, 37);
        assert_eq!(usage.prompt_tokens, 30);
    }

    #[test]
    fn test_message_serialization_skips_empty_fields() {
        let json = serde_json::to_string(&user_message("hi")).unwrap_or_default();
        assert_eq!(json, r#"{"role":"user","content":"hi"}"#);
    }
}

//! Generation client: single-shot requests and the bounded tool round.
//!
//! A tool-enabled generation makes at most two backend requests. When the
//! first response asks for tools, every call is dispatched in order, the
//! results are appended one-to-one, and exactly one follow-up request is
//! sent. Whatever the follow-up contains is final.

use std::sync::Arc;

use tracing::debug;

use super::config::RagConfig;
use super::message::{
    ChatMessage, ChatRequest, TokenUsage, ToolChoice, assistant_tool_calls_message,
    system_message, tool_message, user_message,
};
use super::prompt::build_system_content;
use super::provider::LlmProvider;
use super::tool::{ToolDefinition, ToolRegistry, ToolResult};
use crate::core::Source;
use crate::error::GenerationError;

/// Request parameters fixed for a client's lifetime.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    /// Chat model.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Output token cap.
    pub max_tokens: u32,
}

impl GenerationSettings {
    /// Takes the generation fields of a [`RagConfig`].
    #[must_use]
    pub fn from_config(config: &RagConfig) -> Self {
        Self {
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    /// Builds a request carrying these settings.
    #[must_use]
    pub fn request(&self, messages: Vec<ChatMessage>, tools: Vec<ToolDefinition>) -> ChatRequest {
        let tool_choice = if tools.is_empty() {
            ToolChoice::None
        } else {
            ToolChoice::Auto
        };
        ChatRequest {
            model: self.model.clone(),
            messages,
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
            tools,
            tool_choice,
        }
    }
}

/// The outcome of one generation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Generation {
    /// Final answer text.
    pub content: String,
    /// Results of the tool round, in invocation order. Empty when no tools ran.
    pub tool_results: Vec<ToolResult>,
    /// Usage summed over every request made.
    pub usage: TokenUsage,
}

impl Generation {
    /// Sources produced by the tool round, in invocation order.
    #[must_use]
    pub fn sources(&self) -> Vec<Source> {
        self.tool_results
            .iter()
            .flat_map(|r| r.sources.iter().cloned())
            .collect()
    }
}

/// Sends chat requests on behalf of the orchestrator.
pub struct GenerationClient {
    provider: Arc<dyn LlmProvider>,
    settings: GenerationSettings,
    system_prompt: String,
}

impl GenerationClient {
    /// Creates a client.
    #[must_use]
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        settings: GenerationSettings,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            settings,
            system_prompt: system_prompt.into(),
        }
    }

    /// Fixed request settings.
    #[must_use]
    pub const fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    /// System prompt in use.
    #[must_use]
    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    fn conversation(&self, prompt: &str, history: Option<&str>) -> Vec<ChatMessage> {
        vec![
            system_message(&build_system_content(&self.system_prompt, history)),
            user_message(prompt),
        ]
    }

    /// One request with no tools advertised.
    ///
    /// # Errors
    ///
    /// Propagates the provider's [`GenerationError`].
    pub async fn generate(
        &self,
        prompt: &str,
        history: Option<&str>,
    ) -> Result<Generation, GenerationError> {
        let request = self
            .settings
            .request(self.conversation(prompt, history), Vec::new());
        let response = self.provider.chat(&request).await?;
        debug!(
            provider = self.provider.name(),
            tokens = response.usage.total_tokens,
            "generation complete"
        );
        Ok(Generation {
            content: response.content,
            tool_results: Vec::new(),
            usage: response.usage,
        })
    }

    /// Generation with the registry's tools advertised and at most one
    /// tool round.
    ///
    /// # Errors
    ///
    /// Propagates the provider's [`GenerationError`] from either request.
    /// Tool failures never error; they become textual tool results.
    pub async fn generate_with_tools(
        &self,
        prompt: &str,
        history: Option<&str>,
        tools: &ToolRegistry,
    ) -> Result<Generation, GenerationError> {
        let schemas = tools.get_tool_schemas();
        let mut request = self
            .settings
            .request(self.conversation(prompt, history), schemas);

        let first = self.provider.chat(&request).await?;
        let mut usage = first.usage;

        if first.tool_calls.is_empty() {
            debug!(
                provider = self.provider.name(),
                tokens = usage.total_tokens,
                "generation complete without tool calls"
            );
            return Ok(Generation {
                content: first.content,
                tool_results: Vec::new(),
                usage,
            });
        }

        debug!(
            tool_count = first.tool_calls.len(),
            "executing tool round"
        );
        let tool_results: Vec<ToolResult> =
            first.tool_calls.iter().map(|call| tools.dispatch(call)).collect();

        request
            .messages
            .push(assistant_tool_calls_message(&first.content, first.tool_calls));
        request.messages.extend(
            tool_results
                .iter()
                .map(|r| tool_message(&r.tool_call_id, &r.content)),
        );

        let follow_up = self.provider.chat(&request).await?;
        usage.accumulate(follow_up.usage);
        if !follow_up.tool_calls.is_empty() {
            debug!(
                ignored = follow_up.tool_calls.len(),
                "follow-up requested more tools; round limit reached"
            );
        }

        Ok(Generation {
            content: follow_up.content,
            tool_results,
            usage,
        })
    }
}

impl std::fmt::Debug for GenerationClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationClient")
            .field("provider", &self.provider.name())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::agent::message::Role;
    use crate::agent::mock::ScriptedProvider;
    use crate::agent::tool::{Tool, ToolCall, ToolOutput};
    use crate::error::ToolError;
    use serde_json::{Value, json};

    struct Lookup;

    impl Tool for Lookup {
        fn name(&self) -> &str {
            "lookup"
        }

        fn definition(&self) -> ToolDefinition {
            ToolDefinition {
                name: "lookup".to_string(),
                description: "Looks things up".to_string(),
                parameters: json!({"type": "object", "properties": {"q": {"type": "string"}}}),
            }
        }

        fn execute(&self, arguments: &Value) -> Result<ToolOutput, ToolError> {
            let q = arguments["q"].as_str().unwrap_or_default();
            Ok(ToolOutput::with_sources(
                format!("result for {q}"),
                vec![Source {
                    text: format!("src {q}"),
                    link: None,
                }],
            ))
        }
    }

    fn settings() -> GenerationSettings {
        GenerationSettings {
            model: "test-model".to_string(),
            temperature: 0.1,
            max_tokens: 800,
        }
    }

    fn client(provider: &ScriptedProvider) -> GenerationClient {
        GenerationClient::new(Arc::new(provider.clone()), settings(), "SYS")
    }

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(Lookup));
        registry
    }

    #[tokio::test]
    async fn test_generate_sends_no_tools() {
        let provider = ScriptedProvider::new().then_text("plain answer");
        let generation = client(&provider)
            .generate("question", Some("User: a\nAssistant: b"))
            .await
            .unwrap_or_else(|e| panic!("generate failed: {e}"));

        assert_eq!(generation.content, "plain answer");
        let requests = provider.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].tools.is_empty());
        assert_eq!(requests[0].tool_choice, ToolChoice::None);
        assert_eq!(requests[0].max_tokens, Some(800));
        assert_eq!(
            requests[0].messages[0].content,
            "SYS\n\nPrevious conversation:\nUser: a\nAssistant: b"
        );
        assert_eq!(requests[0].messages[1].content, "question");
    }

    #[tokio::test]
    async fn test_no_tool_calls_is_terminal() {
        let provider = ScriptedProvider::new().then_text("direct");
        let generation = client(&provider)
            .generate_with_tools("q", None, &registry())
            .await
            .unwrap_or_else(|e| panic!("generate failed: {e}"));

        assert_eq!(generation.content, "direct");
        assert!(generation.tool_results.is_empty());
        assert_eq!(provider.call_count(), 1);
        let request = &provider.requests()[0];
        assert_eq!(request.tool_choice, ToolChoice::Auto);
        assert_eq!(request.tools.len(), 1);
    }

    #[tokio::test]
    async fn test_tool_round_makes_exactly_one_follow_up() {
        let provider = ScriptedProvider::new()
            .then_tool_calls(vec![
                ToolCall::new("c1", "lookup", r#"{"q":"one"}"#),
                ToolCall::new("c2", "lookup", r#"{"q":"two"}"#),
            ])
            .then_tool_calls(vec![ToolCall::new("c3", "lookup", r#"{"q":"three"}"#)]);

        let generation = client(&provider)
            .generate_with_tools("q", None, &registry())
            .await
            .unwrap_or_else(|e| panic!("generate failed: {e}"));

        assert_eq!(provider.call_count(), 2);
        assert!(generation.content.is_empty());
        assert_eq!(generation.tool_results.len(), 2);
        assert_eq!(generation.usage.total_tokens, 20);
    }

    #[tokio::test]
    async fn test_tool_messages_follow_invocation_order() {
        let provider = ScriptedProvider::new()
            .then_tool_calls(vec![
                ToolCall::new("c1", "lookup", r#"{"q":"one"}"#),
                ToolCall::new("c2", "missing", "{}"),
                ToolCall::new("c3", "lookup", "{broken"),
            ])
            .then_text("final");

        let generation = client(&provider)
            .generate_with_tools("q", None, &registry())
            .await
            .unwrap_or_else(|e| panic!("generate failed: {e}"));

        assert_eq!(generation.content, "final");
        let follow_up = &provider.requests()[1];
        let roles: Vec<Role> = follow_up.messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![
                Role::System,
                Role::User,
                Role::Assistant,
                Role::Tool,
                Role::Tool,
                Role::Tool
            ]
        );
        let ids: Vec<&str> = follow_up.messages[3..]
            .iter()
            .filter_map(|m| m.tool_call_id.as_deref())
            .collect();
        assert_eq!(ids, vec!["c1", "c2", "c3"]);
        assert_eq!(follow_up.messages[2].tool_calls.len(), 3);
        assert_eq!(follow_up.messages[3].content, "result for one");
        assert!(follow_up.messages[4].content.contains("no result available"));
        assert!(follow_up.messages[5].content.contains("invalid arguments"));
        assert_eq!(follow_up.tools.len(), 1);
        assert_eq!(follow_up.tool_choice, ToolChoice::Auto);
    }

    #[tokio::test]
    async fn test_sources_follow_tool_results() {
        let provider = ScriptedProvider::new()
            .then_tool_calls(vec![
                ToolCall::new("c1", "lookup", r#"{"q":"b"}"#),
                ToolCall::new("c2", "lookup", r#"{"q":"a"}"#),
            ])
            .then_text("final");
        let generation = client(&provider)
            .generate_with_tools("q", None, &registry())
            .await
            .unwrap_or_else(|e| panic!("generate failed: {e}"));
        let texts: Vec<String> = generation.sources().into_iter().map(|s| s.text).collect();
        assert_eq!(texts, vec!["src b".to_string(), "src a".to_string()]);
    }

    #[tokio::test]
    async fn test_follow_up_error_propagates() {
        let provider = ScriptedProvider::new()
            .then_tool_calls(vec![ToolCall::new("c1", "lookup", r#"{"q":"x"}"#)])
            .then_error("backend down");
        let result = client(&provider)
            .generate_with_tools("q", None, &registry())
            .await;
        assert!(matches!(result, Err(GenerationError::ApiRequest { .. })));
        assert_eq!(provider.call_count(), 2);
    }
}

//! Tool descriptors, calls, results, and the tool registry.
//!
//! Tools are trait objects registered once at startup. The generation
//! client only sees [`ToolDefinition`]s and hands every [`ToolCall`] to
//! [`ToolRegistry::dispatch`], which never fails: lookup misses, bad
//! arguments, and capability errors all come back as textual results.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::core::Source;
use crate::error::ToolError;

/// Maximum raw byte length of tool argument JSON accepted from the model.
pub const MAX_TOOL_ARGS_LEN: usize = 100_000;

/// A tool schema advertised to the generation backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Unique tool name.
    pub name: String,
    /// What the tool does, written for the model.
    pub description: String,
    /// JSON Schema of the arguments object.
    pub parameters: Value,
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Provider-assigned invocation id.
    pub id: String,
    /// Tool name.
    pub name: String,
    /// JSON-encoded arguments as produced by the model.
    pub arguments: String,
}

impl ToolCall {
    /// Creates a call.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }
}

/// What a tool hands back: text for the model plus citations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Text sent back to the model.
    pub content: String,
    /// Sources backing the text, in presentation order.
    pub sources: Vec<Source>,
    /// Whether `content` describes a failure.
    pub is_error: bool,
}

impl ToolOutput {
    /// Plain text output with no sources.
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    /// Text output with sources.
    #[must_use]
    pub fn with_sources(content: impl Into<String>, sources: Vec<Source>) -> Self {
        Self {
            content: content.into(),
            sources,
            is_error: false,
        }
    }

    /// Failure rendered as text.
    #[must_use]
    pub fn error(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            sources: Vec::new(),
            is_error: true,
        }
    }
}

/// The outcome of one dispatched invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Invocation id this result answers.
    pub tool_call_id: String,
    /// Tool name as requested.
    pub name: String,
    /// Text sent back to the model.
    pub content: String,
    /// Whether the invocation failed.
    pub is_error: bool,
    /// Sources the tool produced.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<Source>,
}

impl ToolResult {
    fn from_output(call: &ToolCall, output: ToolOutput) -> Self {
        Self {
            tool_call_id: call.id.clone(),
            name: call.name.clone(),
            content: output.content,
            is_error: output.is_error,
            sources: output.sources,
        }
    }
}

/// A callable capability the model may invoke.
pub trait Tool: Send + Sync {
    /// Registry key; must equal `definition().name`.
    fn name(&self) -> &str;

    /// Schema advertised to the model.
    fn definition(&self) -> ToolDefinition;

    /// Runs the tool on parsed JSON arguments.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::InvalidArguments`] when `arguments` do not fit
    /// the schema and [`ToolError::Execution`] when the capability fails.
    fn execute(&self, arguments: &Value) -> Result<ToolOutput, ToolError>;
}

/// Name-keyed set of tools, iterated in registration order.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool. A tool with the same name is replaced in place.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        if let Some(slot) = self.tools.iter_mut().find(|t| t.name() == tool.name()) {
            debug!(tool = tool.name(), "replacing registered tool");
            *slot = tool;
        } else {
            self.tools.push(tool);
        }
    }

    /// Descriptors of every registered tool, in registration order.
    #[must_use]
    pub fn get_tool_schemas(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    /// Registered tool names, in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// Number of registered tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Returns `true` when no tools are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Executes a tool by name.
    ///
    /// Capability failures are folded into an error [`ToolOutput`].
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::NotFound`] when no tool has this name.
    pub fn execute(&self, name: &str, arguments: &Value) -> Result<ToolOutput, ToolError> {
        let tool = self
            .tools
            .iter()
            .find(|t| t.name() == name)
            .ok_or_else(|| ToolError::NotFound {
                name: name.to_string(),
            })?;
        Ok(tool
            .execute(arguments)
            .unwrap_or_else(|e| ToolOutput::error(e.to_string())))
    }

    /// Runs one model-issued call and always produces a result for it.
    #[must_use]
    pub fn dispatch(&self, call: &ToolCall) -> ToolResult {
        if call.arguments.len() > MAX_TOOL_ARGS_LEN {
            return ToolResult::from_output(
                call,
                ToolOutput::error(format!(
                    "tool arguments too large ({} bytes, max {MAX_TOOL_ARGS_LEN})",
                    call.arguments.len()
                )),
            );
        }

        let output = match parse_arguments(&call.name, &call.arguments) {
            Ok(arguments) => self
                .execute(&call.name, &arguments)
                .unwrap_or_else(|e| ToolOutput::error(e.to_string())),
            Err(e) => ToolOutput::error(e.to_string()),
        };
        debug!(
            tool = call.name,
            call_id = call.id,
            is_error = output.is_error,
            sources = output.sources.len(),
            "tool dispatched"
        );
        ToolResult::from_output(call, output)
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

/// Empty or blank argument strings count as `{}`.
fn parse_arguments(name: &str, raw: &str) -> Result<Value, ToolError> {
    if raw.trim().is_empty() {
        return Ok(Value::Object(serde_json::Map::new()));
    }
    serde_json::from_str(raw).map_err(|e| ToolError::InvalidArguments {
        name: name.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Echo {
        name: &'static str,
        prefix: &'static str,
    }

    impl Tool for Echo {
        fn name(&self) -> &str {
            self.name
        }

        fn definition(&self) -> ToolDefinition {
            ToolDefinition {
                name: self.name.to_string(),
                description: format!("{} tool", self.prefix),
                parameters: json!({"type": "object", "properties": {"text": {"type": "string"}}}),
            }
        }

        fn execute(&self, arguments: &Value) -> Result<ToolOutput, ToolError> {
            let text = arguments["text"]
                .as_str()
                .ok_or_else(|| ToolError::InvalidArguments {
                    name: self.name.to_string(),
                    message: "missing text".to_string(),
                })?;
            Ok(ToolOutput::text(format!("{}{text}", self.prefix)))
        }
    }

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(Echo { name: "first", prefix: "1:" }));
        registry.register(Box::new(Echo { name: "second", prefix: "2:" }));
        registry
    }

    #[test]
    fn test_schemas_in_registration_order() {
        let names: Vec<String> = registry()
            .get_tool_schemas()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec!["first".to_string(), "second".to_string()]);
    }

    #[test]
    fn test_duplicate_registration_overwrites_in_place() {
        let mut registry = registry();
        registry.register(Box::new(Echo { name: "first", prefix: "new:" }));
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names(), vec!["first", "second"]);
        let output = registry
            .execute("first", &json!({"text": "x"}))
            .unwrap_or_else(|e| panic!("execute failed: {e}"));
        assert_eq!(output.content, "new:x");
    }

    #[test]
    fn test_execute_unknown_tool() {
        let err = registry().execute("missing", &json!({}));
        assert!(matches!(err, Err(ToolError::NotFound { .. })));
    }

    #[test]
    fn test_capability_failure_is_textual() {
        let output = registry()
            .execute("first", &json!({}))
            .unwrap_or_else(|e| panic!("execute failed: {e}"));
        assert!(output.is_error);
        assert!(output.content.contains("missing text"));
    }

    #[test]
    fn test_dispatch_unknown_tool_reads_as_no_result() {
        let result = registry().dispatch(&ToolCall::new("c1", "missing", "{}"));
        assert!(result.is_error);
        assert_eq!(result.tool_call_id, "c1");
        assert!(result.content.contains("no result available"));
    }

    #[test]
    fn test_dispatch_malformed_arguments() {
        let result = registry().dispatch(&ToolCall::new("c2", "first", "{not json"));
        assert!(result.is_error);
        assert!(result.content.contains("invalid arguments"));
    }

    #[test]
    fn test_dispatch_oversized_arguments() {
        let big = format!("{{\"text\":\"{}\"}}", "a".repeat(MAX_TOOL_ARGS_LEN));
        let result = registry().dispatch(&ToolCall::new("c3", "first", big));
        assert!(result.is_error);
        assert!(result.content.contains("too large"));
    }

    #[test]
    fn test_dispatch_success() {
        let result = registry().dispatch(&ToolCall::new("c4", "second", r#"{"text":"hi"}"#));
        assert!(!result.is_error);
        assert_eq!(result.content, "2:hi");
        assert_eq!(result.name, "second");
    }
}

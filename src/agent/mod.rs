//! Query orchestration: generation, tools, and retrieval strategies.
//!
//! # Architecture
//!
//! ```text
//! query → QueryOrchestrator
//!   ├── SessionStore (history before, exchange after)
//!   └── RetrievalStrategy (fixed at construction)
//!       ├── PreRetrieval: RetrievalGateway::search → context → GenerationClient::generate
//!       └── ToolDriven:   GenerationClient::generate_with_tools
//!                          └── one tool round via ToolRegistry::dispatch
//! ```
//!
//! Generation goes through a pluggable [`LlmProvider`]; the `openai`
//! provider covers any OpenAI-compatible server.

pub mod client;
pub mod config;
pub mod generation;
pub mod message;
pub mod orchestrator;
pub mod prompt;
pub mod provider;
pub mod providers;
pub mod strategy;
pub mod tool;
pub mod tools;

#[cfg(test)]
pub(crate) mod mock;

pub use client::create_provider;
pub use config::{RagConfig, RagConfigBuilder, RetrievalMode, StoreConfig};
pub use generation::{Generation, GenerationClient, GenerationSettings};
pub use message::{ChatMessage, ChatRequest, ChatResponse, Role, TokenUsage, ToolChoice};
pub use orchestrator::{MAX_QUERY_LEN, QueryAnswer, QueryOrchestrator};
pub use prompt::{PromptSet, SYSTEM_PROMPT};
pub use provider::LlmProvider;
pub use strategy::{GroundedAnswer, PreRetrieval, RetrievalStrategy, ToolDriven};
pub use tool::{Tool, ToolCall, ToolDefinition, ToolOutput, ToolRegistry, ToolResult};
pub use tools::{CourseOutlineTool, CourseSearchTool};

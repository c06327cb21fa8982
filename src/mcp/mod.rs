//! MCP (Model Context Protocol) server for course-rag.
//!
//! Lets a conversational front end drive the assistant over MCP.
//!
//! # Feature Gate
//!
//! This module requires the `mcp` feature flag:
//! ```toml
//! [dependencies]
//! course-rag = { version = "...", features = ["mcp"] }
//! ```
//!
//! # Architecture
//!
//! ```text
//! MCP Client
//!   ↓ query(query, session_id?)
//! CourseRagMcpServer (shared Arc<CourseAssistant>)
//!   ↓
//! QueryOrchestrator::query()
//!   ├── SessionStore history
//!   ├── PreRetrieval search | ToolDriven tool round
//!   └── GenerationClient → answer
//!   ↓
//! QueryAnswer JSON { answer, sources } → MCP Client
//! ```

pub mod params;
pub mod server;
pub mod transport;

pub use params::{QueryParams, SessionParams};
pub use server::CourseRagMcpServer;
pub use transport::{serve_http, serve_stdio};

//! CLI layer for course-rag.
//!
//! Provides the command-line interface using clap, with commands for
//! ingesting course documents, inspecting the store, and asking questions.

pub mod commands;
pub mod output;
pub mod parser;

pub use commands::execute;
pub use output::OutputFormat;
#[cfg(feature = "mcp")]
pub use parser::McpCommands;
pub use parser::{Cli, Commands, QueryOptions};

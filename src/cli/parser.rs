//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::agent::RetrievalMode;

/// course-rag: question answering over course material.
///
/// Ingests course documents into a local `SQLite` store and answers
/// questions about them through an OpenAI-compatible chat model.
#[derive(Parser, Debug)]
#[command(name = "course-rag")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the course database file.
    ///
    /// Defaults to `.course-rag/courses.db` in the current directory.
    #[arg(short, long, env = "COURSE_RAG_DB_PATH")]
    pub db_path: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, default_value = "text", global = true)]
    pub format: String,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ingest every course document (`.txt`, `.md`) in a folder.
    ///
    /// Courses already in the store are skipped unless `--clear` is given.
    #[command(after_help = r#"Examples:
  course-rag ingest ./docs                # Add new courses from ./docs
  course-rag ingest ./docs --clear        # Rebuild the store from ./docs
"#)]
    Ingest {
        /// Folder containing course documents.
        folder: PathBuf,

        /// Delete all stored courses before ingesting.
        #[arg(long)]
        clear: bool,
    },

    /// Add (or replace) a single course document.
    Add {
        /// Course document to ingest.
        file: PathBuf,
    },

    /// Answer one question about the stored courses.
    ///
    /// Requires `OPENAI_API_KEY` (or `COURSE_RAG_BASE_URL` for a local
    /// OpenAI-compatible server).
    #[command(after_help = r#"Examples:
  course-rag query "What is covered in lesson 3 of CS101?"
  course-rag query "Outline of the MCP course" --mode tool-driven
  course-rag --format json query "What is recursion?" | jq '.sources'
"#)]
    Query {
        /// The question.
        text: String,

        /// Session id for conversation history.
        #[arg(short, long)]
        session: Option<String>,

        #[command(flatten)]
        options: QueryOptions,
    },

    /// Interactive question answering with session history.
    ///
    /// Reads one question per line from stdin until EOF or `exit`.
    Chat {
        #[command(flatten)]
        options: QueryOptions,
    },

    /// Show course count and titles.
    Analytics,

    /// Show a course's outline (title, link, lessons).
    Outline {
        /// Course name (exact or partial).
        course: String,
    },

    /// Search stored course content without generating an answer.
    #[command(after_help = r#"Examples:
  course-rag search "recursion"                       # Top passages across courses
  course-rag search "recursion" --course CS101 -l 3   # Only CS101 lesson 3
  course-rag search "closures" -k 10                  # Top 10 passages
"#)]
    Search {
        /// Search query text.
        query: String,

        /// Restrict to one course (exact or partial name).
        #[arg(short, long)]
        course: Option<String>,

        /// Restrict to one lesson number.
        #[arg(short, long)]
        lesson: Option<u32>,

        /// Maximum number of passages.
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },

    /// Write the default system prompt template for customization.
    ///
    /// Creates `system.md` in the target directory (default:
    /// `~/.config/course-rag/prompts/`). Existing files are not overwritten.
    InitPrompts {
        /// Target directory for the template.
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Run the MCP server.
    #[cfg(feature = "mcp")]
    #[command(subcommand)]
    Mcp(McpCommands),
}

/// Options shared by commands that generate answers.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct QueryOptions {
    /// Retrieval mode (`pre-retrieval`, `tool-driven`).
    #[arg(short, long, env = "COURSE_RAG_RETRIEVAL_MODE")]
    pub mode: Option<RetrievalMode>,

    /// Chat model name.
    #[arg(long, env = "COURSE_RAG_MODEL")]
    pub model: Option<String>,

    /// Directory containing prompt template files.
    #[arg(long, env = "COURSE_RAG_PROMPT_DIR")]
    pub prompt_dir: Option<PathBuf>,
}

/// MCP server transports.
#[cfg(feature = "mcp")]
#[derive(Subcommand, Debug)]
pub enum McpCommands {
    /// Serve over stdin/stdout.
    Stdio,

    /// Serve streamable HTTP at `http://{host}:{port}/mcp`.
    Serve {
        /// Bind address.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Bind port.
        #[arg(long, default_value_t = 3000)]
        port: u16,
    },
}

impl Cli {
    /// Returns the database path, using the default if not specified.
    #[must_use]
    pub fn get_db_path(&self) -> PathBuf {
        self.db_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(crate::storage::DEFAULT_DB_PATH))
    }
}

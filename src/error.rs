//! Error types for course-rag.
//!
//! Each layer owns a `thiserror` enum. The CLI folds them into the
//! top-level [`Error`] through `From` conversions so commands can use `?`.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used by the CLI layer.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error for command execution.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be resolved.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Course storage failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A document could not be ingested.
    #[error(transparent)]
    Ingest(#[from] IngestError),

    /// A query failed.
    #[error(transparent)]
    Query(#[from] QueryError),

    /// A CLI command failed.
    #[error(transparent)]
    Command(#[from] CommandError),
}

/// Configuration errors raised while building [`crate::agent::RagConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No API key was configured and no local base URL was given.
    #[error("API key missing: set OPENAI_API_KEY or COURSE_RAG_API_KEY, or point COURSE_RAG_BASE_URL at a local server")]
    ApiKeyMissing,

    /// The requested provider is not known to the provider factory.
    #[error("unsupported provider: {name}")]
    UnsupportedProvider {
        /// Provider name as configured.
        name: String,
    },

    /// A field holds an invalid value.
    #[error("invalid configuration for {field}: {message}")]
    Invalid {
        /// Offending field.
        field: &'static str,
        /// What is wrong with it.
        message: String,
    },
}

/// Failures of the generation backend. Never recovered by the core.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The backend request failed (transport, HTTP status, API error).
    #[error("generation request failed: {message}")]
    ApiRequest {
        /// Error description from the SDK.
        message: String,
        /// HTTP status code, when known.
        status: Option<u16>,
    },

    /// The backend answered with data the client cannot use.
    #[error("malformed generation response: {message}")]
    MalformedResponse {
        /// What was wrong with the response.
        message: String,
    },
}

/// Errors raised by tool lookup and tool execution.
#[derive(Debug, Error)]
pub enum ToolError {
    /// No tool is registered under this name.
    #[error("tool '{name}' not found: no result available")]
    NotFound {
        /// Requested tool name.
        name: String,
    },

    /// The tool arguments could not be parsed or validated.
    #[error("invalid arguments for tool '{name}': {message}")]
    InvalidArguments {
        /// Tool name.
        name: String,
        /// Parse or validation failure.
        message: String,
    },

    /// The capability behind the tool failed.
    #[error("tool '{name}' failed: {message}")]
    Execution {
        /// Tool name.
        name: String,
        /// Failure description.
        message: String,
    },
}

/// Retrieval failures carried inside [`crate::core::SearchResults`].
///
/// Distinct from "no matches": an empty result set has no error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RetrievalError {
    /// The search backend failed or rejected the query.
    #[error("search backend error: {message}")]
    Backend {
        /// Failure description.
        message: String,
    },

    /// A course filter matched no known course.
    #[error("no course found matching '{name}'")]
    CourseNotFound {
        /// Course name as supplied by the caller.
        name: String,
    },
}

impl From<StorageError> for RetrievalError {
    fn from(e: StorageError) -> Self {
        Self::Backend {
            message: e.to_string(),
        }
    }
}

/// Errors from the `SQLite` course store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Underlying database error.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The database directory could not be created.
    #[error("failed to create database directory {path}: {source}")]
    CreateDir {
        /// Directory path.
        path: PathBuf,
        /// I/O error.
        source: std::io::Error,
    },
}

/// Errors raised while turning a course file into chunks.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The file or folder could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path that failed.
        path: PathBuf,
        /// I/O error.
        source: std::io::Error,
    },

    /// The document carries no usable course title.
    #[error("no course title found in {path}")]
    MissingTitle {
        /// Offending document.
        path: PathBuf,
    },

    /// The folder does not exist.
    #[error("folder does not exist: {path}")]
    FolderNotFound {
        /// Missing folder.
        path: PathBuf,
    },

    /// Parsed content could not be stored.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors returned by [`crate::agent::QueryOrchestrator::query`].
#[derive(Debug, Error)]
pub enum QueryError {
    /// The query was rejected before any backend call.
    #[error("invalid query: {message}")]
    InvalidQuery {
        /// Why the query was rejected.
        message: String,
    },

    /// Generation failed; terminal for this query.
    #[error(transparent)]
    Generation(#[from] GenerationError),
}

/// CLI command failures that have no richer type.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Command could not complete.
    #[error("{0}")]
    ExecutionFailed(String),

    /// Output could not be rendered.
    #[error("output formatting failed: {0}")]
    OutputFormat(String),
}

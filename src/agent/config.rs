//! Assistant configuration with builder pattern and environment variable support.
//!
//! Configuration is resolved in order: explicit values → environment variables → defaults.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::ingest::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
use crate::storage::{DEFAULT_DB_PATH, DEFAULT_MAX_RESULTS};

/// Default provider name.
const DEFAULT_PROVIDER: &str = "openai";
/// Default chat model.
const DEFAULT_MODEL: &str = "gpt-4o-mini";
/// Sampling temperature, kept low for factual answers.
pub const DEFAULT_TEMPERATURE: f32 = 0.1;
/// Output token cap per generation request.
pub const DEFAULT_MAX_TOKENS: u32 = 800;
/// Exchanges retained per session.
pub const DEFAULT_MAX_HISTORY: usize = 2;
/// API key placeholder sent to local OpenAI-compatible servers.
const LOCAL_API_KEY: &str = "EMPTY";

/// How a query is grounded in course content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RetrievalMode {
    /// Search with the raw query first, then generate without tools.
    #[default]
    PreRetrieval,
    /// Advertise search as a tool and let the model decide.
    ToolDriven,
}

impl RetrievalMode {
    /// Canonical kebab-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PreRetrieval => "pre-retrieval",
            Self::ToolDriven => "tool-driven",
        }
    }
}

impl fmt::Display for RetrievalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RetrievalMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "pre-retrieval" | "pre" => Ok(Self::PreRetrieval),
            "tool-driven" | "tools" => Ok(Self::ToolDriven),
            other => Err(ConfigError::Invalid {
                field: "retrieval_mode",
                message: format!("expected 'pre-retrieval' or 'tool-driven', got '{other}'"),
            }),
        }
    }
}

/// Storage and ingestion settings. Needs no API key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// `SQLite` database path.
    pub db_path: PathBuf,
    /// Default number of passages returned per search.
    pub max_results: usize,
    /// Chunk size in characters.
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in characters.
    pub chunk_overlap: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            max_results: DEFAULT_MAX_RESULTS,
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

/// Full configuration for answering queries.
#[derive(Debug, Clone, PartialEq)]
pub struct RagConfig {
    /// LLM provider name (e.g., "openai").
    pub provider: String,
    /// API key for the provider.
    pub api_key: String,
    /// Optional base URL override for OpenAI-compatible servers.
    pub base_url: Option<String>,
    /// Chat model.
    pub model: String,
    /// Sampling temperature, fixed for the client's lifetime.
    pub temperature: f32,
    /// Output token cap, fixed for the client's lifetime.
    pub max_tokens: u32,
    /// Exchanges retained per session.
    pub max_history: usize,
    /// Grounding strategy.
    pub retrieval_mode: RetrievalMode,
    /// Directory holding a `system.md` prompt override.
    pub prompt_dir: Option<PathBuf>,
    /// Storage settings.
    pub store: StoreConfig,
}

impl RagConfig {
    /// Creates a new builder for `RagConfig`.
    #[must_use]
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }

    /// Creates configuration from environment variables with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ApiKeyMissing`] if no API key is found.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::builder().from_env().build()
    }
}

/// Builder for [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    provider: Option<String>,
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    max_history: Option<usize>,
    max_results: Option<usize>,
    chunk_size: Option<usize>,
    chunk_overlap: Option<usize>,
    retrieval_mode: Option<String>,
    prompt_dir: Option<PathBuf>,
    db_path: Option<PathBuf>,
}

impl RagConfigBuilder {
    /// Populates unset fields from process environment variables.
    #[must_use]
    pub fn from_env(self) -> Self {
        self.from_lookup(|key| std::env::var(key).ok())
    }

    /// Populates unset fields from an arbitrary variable lookup.
    #[must_use]
    pub fn from_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let parsed = |key: &str| lookup(key).and_then(|v| v.trim().parse().ok());

        if self.provider.is_none() {
            self.provider = lookup("COURSE_RAG_PROVIDER");
        }
        if self.api_key.is_none() {
            self.api_key = lookup("OPENAI_API_KEY").or_else(|| lookup("COURSE_RAG_API_KEY"));
        }
        if self.base_url.is_none() {
            self.base_url = lookup("OPENAI_BASE_URL").or_else(|| lookup("COURSE_RAG_BASE_URL"));
        }
        if self.model.is_none() {
            self.model = lookup("COURSE_RAG_MODEL");
        }
        if self.max_history.is_none() {
            self.max_history = parsed("COURSE_RAG_MAX_HISTORY");
        }
        if self.max_results.is_none() {
            self.max_results = parsed("COURSE_RAG_MAX_RESULTS");
        }
        if self.retrieval_mode.is_none() {
            self.retrieval_mode = lookup("COURSE_RAG_RETRIEVAL_MODE");
        }
        if self.prompt_dir.is_none() {
            self.prompt_dir = lookup("COURSE_RAG_PROMPT_DIR").map(PathBuf::from);
        }
        if self.db_path.is_none() {
            self.db_path = lookup("COURSE_RAG_DB_PATH").map(PathBuf::from);
        }
        self
    }

    /// Sets the LLM provider name.
    #[must_use]
    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Sets the API key.
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the base URL override.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the chat model.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the sampling temperature.
    #[must_use]
    pub const fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Sets the output token cap.
    #[must_use]
    pub const fn max_tokens(mut self, n: u32) -> Self {
        self.max_tokens = Some(n);
        self
    }

    /// Sets the session retention window.
    #[must_use]
    pub const fn max_history(mut self, n: usize) -> Self {
        self.max_history = Some(n);
        self
    }

    /// Sets the default number of passages per search.
    #[must_use]
    pub const fn max_results(mut self, n: usize) -> Self {
        self.max_results = Some(n);
        self
    }

    /// Sets the chunk size.
    #[must_use]
    pub const fn chunk_size(mut self, n: usize) -> Self {
        self.chunk_size = Some(n);
        self
    }

    /// Sets the chunk overlap.
    #[must_use]
    pub const fn chunk_overlap(mut self, n: usize) -> Self {
        self.chunk_overlap = Some(n);
        self
    }

    /// Sets the retrieval mode.
    #[must_use]
    pub fn retrieval_mode(mut self, mode: RetrievalMode) -> Self {
        self.retrieval_mode = Some(mode.as_str().to_string());
        self
    }

    /// Sets the prompt template directory.
    #[must_use]
    pub fn prompt_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.prompt_dir = Some(dir.into());
        self
    }

    /// Sets the database path.
    #[must_use]
    pub fn db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.db_path = Some(path.into());
        self
    }

    /// Builds only the storage settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the chunk overlap is not
    /// smaller than the chunk size or a size is zero.
    pub fn build_store(&self) -> Result<StoreConfig, ConfigError> {
        let chunk_size = self.chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE);
        let chunk_overlap = self.chunk_overlap.unwrap_or(DEFAULT_CHUNK_OVERLAP);
        if chunk_size == 0 {
            return Err(ConfigError::Invalid {
                field: "chunk_size",
                message: "must be greater than zero".to_string(),
            });
        }
        if chunk_overlap >= chunk_size {
            return Err(ConfigError::Invalid {
                field: "chunk_overlap",
                message: format!("{chunk_overlap} must be smaller than chunk_size {chunk_size}"),
            });
        }
        let max_results = self.max_results.unwrap_or(DEFAULT_MAX_RESULTS);
        if max_results == 0 {
            return Err(ConfigError::Invalid {
                field: "max_results",
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(StoreConfig {
            db_path: self
                .db_path
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH)),
            max_results,
            chunk_size,
            chunk_overlap,
        })
    }

    /// Builds the [`RagConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ApiKeyMissing`] if no API key was set and no
    /// base URL points at a local server, or [`ConfigError::Invalid`] for
    /// out-of-range values.
    pub fn build(self) -> Result<RagConfig, ConfigError> {
        let store = self.build_store()?;

        let api_key = match (self.api_key, &self.base_url) {
            (Some(key), _) if !key.trim().is_empty() => key,
            (_, Some(_)) => LOCAL_API_KEY.to_string(),
            _ => return Err(ConfigError::ApiKeyMissing),
        };

        let retrieval_mode = self
            .retrieval_mode
            .as_deref()
            .map(RetrievalMode::from_str)
            .transpose()?
            .unwrap_or_default();

        let temperature = self.temperature.unwrap_or(DEFAULT_TEMPERATURE);
        if !(0.0..=2.0).contains(&temperature) {
            return Err(ConfigError::Invalid {
                field: "temperature",
                message: format!("{temperature} is outside 0.0..=2.0"),
            });
        }

        Ok(RagConfig {
            provider: self
                .provider
                .unwrap_or_else(|| DEFAULT_PROVIDER.to_string()),
            api_key,
            base_url: self.base_url,
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature,
            max_tokens: self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            max_history: self.max_history.unwrap_or(DEFAULT_MAX_HISTORY),
            retrieval_mode,
            prompt_dir: self.prompt_dir,
            store,
        })
    }
}

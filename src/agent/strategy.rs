//! Retrieval strategies: how a query gets grounded before or during generation.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::config::RetrievalMode;
use super::generation::GenerationClient;
use super::message::TokenUsage;
use super::prompt::{build_context_prompt, build_no_context_prompt, build_tool_prompt};
use super::tool::ToolRegistry;
use super::tools::{CourseOutlineTool, CourseSearchTool, render_hits};
use crate::core::{SearchQuery, Source};
use crate::error::GenerationError;
use crate::storage::{CourseCatalog, RetrievalGateway};

/// An answer with the sources that ground it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroundedAnswer {
    /// Answer text.
    pub answer: String,
    /// Citations in presentation order.
    pub sources: Vec<Source>,
    /// Tokens spent producing the answer.
    pub usage: TokenUsage,
}

/// Grounds and answers one query. Chosen once when the orchestrator is built.
#[async_trait]
pub trait RetrievalStrategy: Send + Sync {
    /// Which mode this strategy implements.
    fn mode(&self) -> RetrievalMode;

    /// Produces an answer for `query` given the rendered session history.
    ///
    /// # Errors
    ///
    /// Only generation failures escape; retrieval failures are absorbed.
    async fn answer(
        &self,
        client: &GenerationClient,
        query: &str,
        history: Option<&str>,
    ) -> Result<GroundedAnswer, GenerationError>;
}

/// Searches with the raw query, then generates once with tools disabled.
///
/// For backends without reliable function calling.
pub struct PreRetrieval {
    gateway: Arc<dyn RetrievalGateway>,
    max_results: Option<usize>,
}

impl PreRetrieval {
    /// Creates the strategy. `None` uses the gateway's default result limit.
    #[must_use]
    pub fn new(gateway: Arc<dyn RetrievalGateway>, max_results: Option<usize>) -> Self {
        Self {
            gateway,
            max_results,
        }
    }
}

#[async_trait]
impl RetrievalStrategy for PreRetrieval {
    fn mode(&self) -> RetrievalMode {
        RetrievalMode::PreRetrieval
    }

    async fn answer(
        &self,
        client: &GenerationClient,
        query: &str,
        history: Option<&str>,
    ) -> Result<GroundedAnswer, GenerationError> {
        let mut search = SearchQuery::new(query);
        if let Some(limit) = self.max_results {
            search = search.with_limit(limit);
        }
        let results = self.gateway.search(&search);

        let (context, sources) = if let Some(error) = results.error() {
            warn!(error = %error, "retrieval failed; answering without course content");
            (String::new(), Vec::new())
        } else {
            render_hits(results.hits(), self.gateway.as_ref())
        };
        debug!(passages = sources.len(), "pre-retrieval complete");

        let prompt = if context.is_empty() {
            build_no_context_prompt(query)
        } else {
            build_context_prompt(&context, query)
        };

        let generation = client.generate(&prompt, history).await?;
        Ok(GroundedAnswer {
            answer: generation.content,
            sources,
            usage: generation.usage,
        })
    }
}

/// Advertises course tools and lets the model decide whether to search.
pub struct ToolDriven {
    tools: ToolRegistry,
}

impl ToolDriven {
    /// Creates the strategy over an existing registry.
    #[must_use]
    pub const fn new(tools: ToolRegistry) -> Self {
        Self { tools }
    }

    /// Registers the content search and outline tools.
    #[must_use]
    pub fn with_course_tools(
        gateway: Arc<dyn RetrievalGateway>,
        catalog: Arc<dyn CourseCatalog>,
    ) -> Self {
        let mut tools = ToolRegistry::new();
        tools.register(Box::new(CourseSearchTool::new(gateway)));
        tools.register(Box::new(CourseOutlineTool::new(catalog)));
        Self::new(tools)
    }

    /// Registered tools.
    #[must_use]
    pub const fn tools(&self) -> &ToolRegistry {
        &self.tools
    }
}

#[async_trait]
impl RetrievalStrategy for ToolDriven {
    fn mode(&self) -> RetrievalMode {
        RetrievalMode::ToolDriven
    }

    async fn answer(
        &self,
        client: &GenerationClient,
        query: &str,
        history: Option<&str>,
    ) -> Result<GroundedAnswer, GenerationError> {
        let generation = client
            .generate_with_tools(&build_tool_prompt(query), history, &self.tools)
            .await?;
        Ok(GroundedAnswer {
            sources: generation.sources(),
            answer: generation.content,
            usage: generation.usage,
        })
    }
}

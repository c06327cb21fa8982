//! MCP server implementation for course-rag.
//!
//! Exposes the query orchestrator as MCP tools and the course catalog as
//! MCP resources. One [`CourseAssistant`] is shared by every connection, so
//! session ids stay valid across HTTP sessions.

use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    AnnotateAble, CallToolResult, Content, Implementation, ListResourceTemplatesResult,
    ListResourcesResult, PaginatedRequestParams, ProtocolVersion, RawResource, RawResourceTemplate,
    ReadResourceRequestParams, ReadResourceResult, ResourceContents, ServerCapabilities,
    ServerInfo,
};
use rmcp::service::RequestContext;
use rmcp::{ErrorData as McpError, RoleServer, ServerHandler, tool, tool_handler, tool_router};

use crate::agent::RagConfig;
use crate::assistant::CourseAssistant;

use super::params::{QueryParams, SessionParams};

/// URI scheme for course resources.
const URI_SCHEME: &str = "course-rag://";

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, McpError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("Serialization error: {e}"), None))
}

/// course-rag MCP server.
///
/// Provides MCP tools for answering questions and managing sessions, and
/// MCP resources for browsing course outlines.
#[derive(Clone)]
pub struct CourseRagMcpServer {
    tool_router: ToolRouter<Self>,
    assistant: Arc<CourseAssistant>,
}

#[tool_router]
impl CourseRagMcpServer {
    /// Answer a question grounded in the stored course materials.
    #[tool(
        name = "query",
        description = "Answer a question about the course materials. Retrieves relevant lesson content, generates a concise answer, and returns JSON with the answer and its sources (course/lesson labels with links). Pass a session_id from create_session to keep conversation history."
    )]
    async fn query(
        &self,
        Parameters(params): Parameters<QueryParams>,
    ) -> Result<CallToolResult, McpError> {
        let answer = self
            .assistant
            .query(&params.query, params.session_id.as_deref())
            .await
            .map_err(|e| match e {
                crate::error::QueryError::InvalidQuery { .. } => {
                    McpError::invalid_params(e.to_string(), None)
                }
                crate::error::QueryError::Generation(_) => {
                    McpError::internal_error(format!("Query failed: {e}"), None)
                }
            })?;

        Ok(CallToolResult::success(vec![Content::text(to_json(&answer)?)]))
    }

    /// Course count and titles.
    #[tool(
        name = "course_analytics",
        description = "Return the number of stored courses and their titles as JSON."
    )]
    async fn course_analytics(&self) -> Result<CallToolResult, McpError> {
        let analytics = self
            .assistant
            .analytics()
            .map_err(|e| McpError::internal_error(format!("Analytics failed: {e}"), None))?;

        Ok(CallToolResult::success(vec![Content::text(to_json(&analytics)?)]))
    }

    /// Mint a session id for multi-turn conversations.
    #[tool(
        name = "create_session",
        description = "Create a conversation session. Returns the session id to pass to query."
    )]
    async fn create_session(&self) -> Result<CallToolResult, McpError> {
        let session_id = self.assistant.create_session();
        Ok(CallToolResult::success(vec![Content::text(session_id)]))
    }

    /// Forget a session's history.
    #[tool(
        name = "clear_session",
        description = "Forget a conversation session and its history."
    )]
    async fn clear_session(
        &self,
        Parameters(params): Parameters<SessionParams>,
    ) -> Result<CallToolResult, McpError> {
        self.assistant.clear_session(&params.session_id);
        Ok(CallToolResult::success(vec![Content::text(format!(
            "Cleared {}",
            params.session_id
        ))]))
    }
}

#[tool_handler]
impl ServerHandler for CourseRagMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            server_info: Implementation {
                name: "course-rag".to_string(),
                title: Some("course-rag MCP Server".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: None,
            },
            instructions: Some(format!(
                "course-rag answers questions about ingested course materials ({} mode). \
                 Use `query` to ask, `create_session` for multi-turn history, and \
                 `course_analytics` to list courses. Browse course outlines via resources.",
                self.assistant.mode()
            )),
        }
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        let analytics = self
            .assistant
            .analytics()
            .map_err(|e| McpError::internal_error(format!("Failed to list courses: {e}"), None))?;

        let resources = analytics
            .course_titles
            .into_iter()
            .map(|title| {
                let mut raw = RawResource::new(format!("{URI_SCHEME}{title}"), title.clone());
                raw.description = Some(format!("Outline of {title}"));
                raw.mime_type = Some("application/json".to_string());
                raw.no_annotation()
            })
            .collect();

        Ok(ListResourcesResult {
            resources,
            next_cursor: None,
            meta: None,
        })
    }

    async fn read_resource(
        &self,
        ReadResourceRequestParams { uri, .. }: ReadResourceRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        let name = uri.strip_prefix(URI_SCHEME).ok_or_else(|| {
            McpError::invalid_params(
                format!("Invalid URI scheme, expected {URI_SCHEME}: {uri}"),
                None,
            )
        })?;

        let course = self
            .assistant
            .library()
            .outline(name)
            .map_err(|e| McpError::internal_error(format!("Storage error: {e}"), None))?
            .ok_or_else(|| {
                McpError::resource_not_found(format!("No course found matching '{name}'"), None)
            })?;

        Ok(ReadResourceResult {
            contents: vec![ResourceContents::text(to_json(&course)?, uri.clone())],
        })
    }

    async fn list_resource_templates(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourceTemplatesResult, McpError> {
        let outline_template = RawResourceTemplate {
            uri_template: format!("{URI_SCHEME}{{course_name}}"),
            name: "Course outline".to_string(),
            title: None,
            description: Some(
                "Returns JSON with the course title, link, instructor, and lessons. \
                 Partial course names are resolved to the closest title."
                    .to_string(),
            ),
            mime_type: Some("application/json".to_string()),
            icons: None,
        };

        Ok(ListResourceTemplatesResult {
            resource_templates: vec![outline_template.no_annotation()],
            next_cursor: None,
            meta: None,
        })
    }
}

impl CourseRagMcpServer {
    /// Creates a server over an existing assistant.
    #[must_use]
    pub fn with_assistant(assistant: Arc<CourseAssistant>) -> Self {
        Self {
            tool_router: Self::tool_router(),
            assistant,
        }
    }

    /// Creates a new MCP server from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be opened or the LLM provider
    /// cannot be created.
    pub fn new(config: &RagConfig) -> Result<Self, crate::error::Error> {
        let assistant = CourseAssistant::from_config(config)?;
        Ok(Self::with_assistant(Arc::new(assistant)))
    }

    /// The shared assistant.
    #[must_use]
    pub const fn assistant(&self) -> &Arc<CourseAssistant> {
        &self.assistant
    }
}

//! Query orchestrator: the top-level query pipeline.
//!
//! validate → read session history → strategy (retrieval + generation)
//! → append exchange → answer with sources.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::config::RetrievalMode;
use super::generation::GenerationClient;
use super::strategy::RetrievalStrategy;
use crate::core::Source;
use crate::error::QueryError;
use crate::session::SessionStore;

/// Maximum accepted query length in bytes.
pub const MAX_QUERY_LEN: usize = 10_000;

/// What the client receives for one query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryAnswer {
    /// Answer text.
    pub answer: String,
    /// Citations, possibly empty.
    pub sources: Vec<Source>,
}

/// Coordinates session memory, retrieval, and generation for each query.
pub struct QueryOrchestrator {
    client: GenerationClient,
    strategy: Box<dyn RetrievalStrategy>,
    sessions: Arc<SessionStore>,
}

impl QueryOrchestrator {
    /// Creates an orchestrator. The strategy is fixed for its lifetime.
    #[must_use]
    pub fn new(
        client: GenerationClient,
        strategy: Box<dyn RetrievalStrategy>,
        sessions: Arc<SessionStore>,
    ) -> Self {
        Self {
            client,
            strategy,
            sessions,
        }
    }

    /// Active retrieval mode.
    #[must_use]
    pub fn mode(&self) -> RetrievalMode {
        self.strategy.mode()
    }

    /// Session store shared with callers.
    #[must_use]
    pub const fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// Answers a query, optionally within a session.
    ///
    /// With a session id, the session's history is sent with the request
    /// and the exchange is recorded afterwards. Retrieval failures degrade
    /// to an answer without course content.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidQuery`] for empty or oversized queries
    /// and [`QueryError::Generation`] when the backend fails. A failed
    /// query leaves the session untouched.
    pub async fn query(
        &self,
        query: &str,
        session_id: Option<&str>,
    ) -> Result<QueryAnswer, QueryError> {
        validate_query(query)?;

        let start = Instant::now();
        let history = session_id.and_then(|id| self.sessions.get_history(id));
        debug!(
            mode = %self.strategy.mode(),
            session = session_id.unwrap_or("-"),
            has_history = history.is_some(),
            "query started"
        );

        let grounded = self
            .strategy
            .answer(&self.client, query, history.as_deref())
            .await?;

        if let Some(id) = session_id {
            self.sessions.add_exchange(id, query, &grounded.answer);
        }

        info!(
            mode = %self.strategy.mode(),
            sources = grounded.sources.len(),
            tokens = grounded.usage.total_tokens,
            elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            "query answered"
        );
        Ok(QueryAnswer {
            answer: grounded.answer,
            sources: grounded.sources,
        })
    }
}

impl std::fmt::Debug for QueryOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryOrchestrator")
            .field("client", &self.client)
            .field("mode", &self.strategy.mode())
            .field("sessions", &self.sessions)
            .finish()
    }
}

fn validate_query(query: &str) -> Result<(), QueryError> {
    if query.trim().is_empty() {
        return Err(QueryError::InvalidQuery {
            message: "query cannot be empty".to_string(),
        });
    }
    if query.len() > MAX_QUERY_LEN {
        return Err(QueryError::InvalidQuery {
            message: format!(
                "query exceeds maximum length ({} bytes, max {MAX_QUERY_LEN})",
                query.len()
            ),
        });
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::agent::generation::GenerationSettings;
    use crate::agent::mock::ScriptedProvider;
    use crate::agent::strategy::{PreRetrieval, ToolDriven};
    use crate::core::{Course, CourseChunk, Lesson};
    use crate::storage::SqliteCourseStore;

    fn cs101_store() -> Arc<SqliteCourseStore> {
        let store = SqliteCourseStore::in_memory().unwrap_or_else(|e| panic!("store: {e}"));
        let course = Course {
            title: "CS101".to_string(),
            link: None,
            instructor: None,
            lessons: vec![Lesson {
                number: 3,
                title: "Recursion".to_string(),
                link: Some("https://example.com/cs101/lesson-3".to_string()),
            }],
        };
        let chunk = CourseChunk {
            course_title: "CS101".to_string(),
            lesson_number: Some(3),
            chunk_index: 0,
            content: "Recursion is when a function calls itself.".to_string(),
        };
        store
            .add_course(&course, &[chunk])
            .unwrap_or_else(|e| panic!("add: {e}"));
        Arc::new(store)
    }

    fn orchestrator(
        provider: &ScriptedProvider,
        strategy: Box<dyn RetrievalStrategy>,
        max_history: usize,
    ) -> QueryOrchestrator {
        let client = GenerationClient::new(
            Arc::new(provider.clone()),
            GenerationSettings {
                model: "m".to_string(),
                temperature: 0.1,
                max_tokens: 800,
            },
            "SYS",
        );
        QueryOrchestrator::new(client, strategy, Arc::new(SessionStore::new(max_history)))
    }

    fn pre_retrieval(store: &Arc<SqliteCourseStore>) -> Box<dyn RetrievalStrategy> {
        Box::new(PreRetrieval::new(store.clone(), None))
    }

    #[tokio::test]
    async fn test_cs101_lesson_3_scenario() {
        let store = cs101_store();
        let provider = ScriptedProvider::new().then_text("A function that calls itself.");
        let orch = orchestrator(&provider, pre_retrieval(&store), 2);

        let answer = orch
            .query("What is recursion?", Some("s1"))
            .await
            .unwrap_or_else(|e| panic!("query failed: {e}"));

        assert_eq!(answer.answer, "A function that calls itself.");
        assert_eq!(
            answer.sources,
            vec![Source {
                text: "CS101 - Lesson 3".to_string(),
                link: Some("https://example.com/cs101/lesson-3".to_string()),
            }]
        );
        assert_eq!(
            orch.sessions().get_history("s1").as_deref(),
            Some("User: What is recursion?\nAssistant: A function that calls itself.")
        );
        let user = &provider.requests()[0].messages[1].content;
        assert!(user.contains("[CS101 - Lesson 3]\nRecursion is when a function calls itself."));
    }

    #[tokio::test]
    async fn test_history_is_sent_on_next_query() {
        let store = cs101_store();
        let provider = ScriptedProvider::new().then_text("first").then_text("second");
        let orch = orchestrator(&provider, pre_retrieval(&store), 2);

        let _ = orch.query("What is recursion?", Some("s1")).await;
        let _ = orch.query("Give an example", Some("s1")).await;

        let requests = provider.requests();
        assert_eq!(requests[0].messages[0].content, "SYS");
        assert_eq!(
            requests[1].messages[0].content,
            "SYS\n\nPrevious conversation:\nUser: What is recursion?\nAssistant: first"
        );
    }

    #[tokio::test]
    async fn test_without_session_nothing_is_recorded() {
        let store = cs101_store();
        let provider = ScriptedProvider::new().then_text("answer");
        let orch = orchestrator(&provider, pre_retrieval(&store), 2);
        let _ = orch.query("What is recursion?", None).await;
        assert_eq!(orch.sessions().session_count(), 0);
    }

    #[tokio::test]
    async fn test_no_matches_yields_empty_sources() {
        let store = cs101_store();
        let provider = ScriptedProvider::new().then_text("Nothing found.");
        let orch = orchestrator(&provider, pre_retrieval(&store), 2);
        let answer = orch
            .query("photosynthesis", None)
            .await
            .unwrap_or_else(|e| panic!("query failed: {e}"));
        assert!(answer.sources.is_empty());
        assert!(
            provider.requests()[0].messages[1]
                .content
                .contains("no relevant content was found")
        );
    }

    #[tokio::test]
    async fn test_invalid_queries_never_reach_backend() {
        let store = cs101_store();
        let provider = ScriptedProvider::new();
        let orch = orchestrator(&provider, pre_retrieval(&store), 2);

        let empty = orch.query("   ", Some("s1")).await;
        assert!(matches!(empty, Err(QueryError::InvalidQuery { .. })));

        let long = "a".repeat(MAX_QUERY_LEN + 1);
        let too_long = orch.query(&long, Some("s1")).await;
        assert!(matches!(too_long, Err(QueryError::InvalidQuery { .. })));

        assert_eq!(provider.call_count(), 0);
        assert!(orch.sessions().get_history("s1").is_none());
    }

    #[tokio::test]
    async fn test_generation_failure_leaves_session_untouched() {
        let store = cs101_store();
        let provider = ScriptedProvider::new().then_error("upstream 500");
        let orch = orchestrator(&provider, pre_retrieval(&store), 2);
        let result = orch.query("What is recursion?", Some("s1")).await;
        assert!(matches!(result, Err(QueryError::Generation(_))));
        assert!(orch.sessions().get_history("s1").is_none());
    }

    #[tokio::test]
    async fn test_tool_driven_mode() {
        let store = cs101_store();
        let provider = ScriptedProvider::new()
            .then_tool_calls(vec![crate::agent::tool::ToolCall::new(
                "c1",
                crate::agent::tools::SEARCH_TOOL_NAME,
                r#"{"query":"recursion","course_name":"CS101","lesson_number":3}"#,
            )])
            .then_text("A function that calls itself.");
        let strategy = Box::new(ToolDriven::with_course_tools(store.clone(), store));
        let orch = orchestrator(&provider, strategy, 2);

        let answer = orch
            .query("What is recursion?", Some("s1"))
            .await
            .unwrap_or_else(|e| panic!("query failed: {e}"));

        assert_eq!(orch.mode(), RetrievalMode::ToolDriven);
        assert_eq!(answer.sources.len(), 1);
        assert_eq!(
            answer.sources[0].link.as_deref(),
            Some("https://example.com/cs101/lesson-3")
        );
        assert_eq!(provider.call_count(), 2);
        assert!(orch.sessions().get_history("s1").is_some());
    }

    #[test]
    fn test_answer_serialization() {
        let answer = QueryAnswer {
            answer: "a".to_string(),
            sources: vec![Source {
                text: "CS101".to_string(),
                link: None,
            }],
        };
        let json = serde_json::to_string(&answer).unwrap_or_default();
        assert_eq!(json, r#"{"answer":"a","sources":[{"text":"CS101"}]}"#);
    }
}

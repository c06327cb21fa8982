//! Course tools exposed to the model in tool-driven mode.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Value, json};

use super::tool::{Tool, ToolDefinition, ToolOutput};
use crate::core::{SearchHit, SearchQuery, Source};
use crate::error::ToolError;
use crate::storage::{CourseCatalog, RetrievalGateway};

/// Name of the content search tool.
pub const SEARCH_TOOL_NAME: &str = "search_course_content";

/// Name of the outline tool.
pub const OUTLINE_TOOL_NAME: &str = "get_course_outline";

/// Renders hits as `"[{label}]\n{passage}"` blocks joined by a blank line
/// and builds one source per hit, in the same order.
#[must_use]
pub fn render_hits(hits: &[SearchHit], gateway: &dyn RetrievalGateway) -> (String, Vec<Source>) {
    let mut blocks = Vec::with_capacity(hits.len());
    let mut sources = Vec::with_capacity(hits.len());
    for hit in hits {
        let link = hit
            .metadata
            .lesson_number
            .and_then(|n| gateway.lesson_link(&hit.metadata.course_title, n));
        let source = Source::new(&hit.metadata, link);
        blocks.push(format!("[{}]\n{}", source.text, hit.document));
        sources.push(source);
    }
    (blocks.join("\n\n"), sources)
}

fn invalid(name: &str, e: &serde_json::Error) -> ToolError {
    ToolError::InvalidArguments {
        name: name.to_string(),
        message: e.to_string(),
    }
}

#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: String,
    #[serde(default)]
    course_name: Option<String>,
    #[serde(default)]
    lesson_number: Option<u32>,
}

/// Searches course passages with optional course and lesson filters.
pub struct CourseSearchTool {
    gateway: Arc<dyn RetrievalGateway>,
}

impl CourseSearchTool {
    /// Creates the tool over a retrieval gateway.
    #[must_use]
    pub fn new(gateway: Arc<dyn RetrievalGateway>) -> Self {
        Self { gateway }
    }
}

impl Tool for CourseSearchTool {
    fn name(&self) -> &str {
        SEARCH_TOOL_NAME
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: SEARCH_TOOL_NAME.to_string(),
            description: "Search course materials with smart course name matching and lesson filtering"
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "What to search for in the course content"
                    },
                    "course_name": {
                        "type": "string",
                        "description": "Course title (partial matches work, e.g. 'MCP', 'Introduction')"
                    },
                    "lesson_number": {
                        "type": "integer",
                        "description": "Specific lesson number to search within (e.g. 1, 2, 3)"
                    }
                },
                "required": ["query"]
            }),
        }
    }

    fn execute(&self, arguments: &Value) -> Result<ToolOutput, ToolError> {
        let args = SearchArgs::deserialize(arguments).map_err(|e| invalid(SEARCH_TOOL_NAME, &e))?;
        let query = SearchQuery::new(args.query)
            .with_course(args.course_name.clone())
            .with_lesson(args.lesson_number);

        let results = self.gateway.search(&query);
        if let Some(error) = results.error() {
            return Ok(ToolOutput::text(error.to_string()));
        }
        if results.is_empty() {
            let course_scope = args
                .course_name
                .as_ref()
                .map(|course| format!(" in course '{course}'"))
                .unwrap_or_default();
            let lesson_scope = args
                .lesson_number
                .map(|lesson| format!(" in lesson {lesson}"))
                .unwrap_or_default();
            return Ok(ToolOutput::text(format!(
                "No relevant content found{course_scope}{lesson_scope}."
            )));
        }

        let (content, sources) = render_hits(results.hits(), self.gateway.as_ref());
        Ok(ToolOutput::with_sources(content, sources))
    }
}

#[derive(Debug, Deserialize)]
struct OutlineArgs {
    course_name: String,
}

/// Returns a course's title, link, instructor, and lesson list.
pub struct CourseOutlineTool {
    catalog: Arc<dyn CourseCatalog>,
}

impl CourseOutlineTool {
    /// Creates the tool over a course catalog.
    #[must_use]
    pub fn new(catalog: Arc<dyn CourseCatalog>) -> Self {
        Self { catalog }
    }
}

impl Tool for CourseOutlineTool {
    fn name(&self) -> &str {
        OUTLINE_TOOL_NAME
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: OUTLINE_TOOL_NAME.to_string(),
            description: "Get the outline of a course: title, link, instructor, and every lesson"
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "course_name": {
                        "type": "string",
                        "description": "Course title (partial matches work)"
                    }
                },
                "required": ["course_name"]
            }),
        }
    }

    fn execute(&self, arguments: &Value) -> Result<ToolOutput, ToolError> {
        let args =
            OutlineArgs::deserialize(arguments).map_err(|e| invalid(OUTLINE_TOOL_NAME, &e))?;
        let course = self
            .catalog
            .course_outline(&args.course_name)
            .map_err(|e| ToolError::Execution {
                name: OUTLINE_TOOL_NAME.to_string(),
                message: e.to_string(),
            })?;

        let Some(course) = course else {
            return Ok(ToolOutput::text(format!(
                "No course found matching '{}'.",
                args.course_name
            )));
        };

        let mut lines = vec![format!("Course: {}", course.title)];
        if let Some(link) = &course.link {
            lines.push(format!("Link: {link}"));
        }
        if let Some(instructor) = &course.instructor {
            lines.push(format!("Instructor: {instructor}"));
        }
        lines.push(format!("Lessons ({}):", course.lessons.len()));
        lines.extend(
            course
                .lessons
                .iter()
                .map(|lesson| format!("- Lesson {}: {}", lesson.number, lesson.title)),
        );
        let text = lines.join("\n");

        let source = Source {
            text: course.title.clone(),
            link: course.link.clone(),
        };
        Ok(ToolOutput::with_sources(text, vec![source]))
    }
}

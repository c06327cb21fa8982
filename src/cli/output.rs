//! Output formatting for CLI commands.

use serde::Serialize;

use crate::agent::QueryAnswer;
use crate::core::{Course, CourseAnalytics, SearchResults};

/// How command results are rendered on stdout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

impl OutputFormat {
    /// Parses a format name. Unknown names fall back to text.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }

    /// Serializes a value as pretty JSON with a trailing newline.
    #[must_use]
    pub fn to_json<T: Serialize + ?Sized>(self, value: &T) -> String {
        serde_json::to_string_pretty(value)
            .map(|mut s| {
                s.push('\n');
                s
            })
            .unwrap_or_else(|e| format!("{{\"error\": \"serialization failed: {e}\"}}\n"))
    }
}

/// Renders an answer and its numbered sources.
#[must_use]
pub fn format_answer(answer: &QueryAnswer, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut out = answer.answer.trim_end().to_string();
            out.push('\n');
            if !answer.sources.is_empty() {
                out.push_str("\nSources:\n");
                for (i, source) in answer.sources.iter().enumerate() {
                    let line = match &source.link {
                        Some(link) => format!("  [{}] {} <{link}>\n", i + 1, source.text),
                        None => format!("  [{}] {}\n", i + 1, source.text),
                    };
                    out.push_str(&line);
                }
            }
            out
        }
        OutputFormat::Json => format.to_json(answer),
    }
}

/// Renders catalog counts.
#[must_use]
pub fn format_analytics(analytics: &CourseAnalytics, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let titles: String = analytics
                .course_titles
                .iter()
                .map(|title| format!("  - {title}\n"))
                .collect();
            format!("Courses: {}\n{titles}", analytics.total_courses)
        }
        OutputFormat::Json => format.to_json(analytics),
    }
}

/// Renders a course outline.
#[must_use]
pub fn format_outline(course: &Course, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
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
                    .map(|lesson| format!("  {}. {}", lesson.number, lesson.title)),
            );
            lines.push(String::new());
            lines.join("\n")
        }
        OutputFormat::Json => format.to_json(course),
    }
}

/// Renders raw search hits.
#[must_use]
pub fn format_search_results(query: &str, results: &SearchResults, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            if results.is_empty() {
                return format!("No results for: {query}\n");
            }
            let blocks: String = results
                .hits()
                .iter()
                .enumerate()
                .map(|(i, hit)| {
                    format!(
                        "\n[{}] {}\n{}\n",
                        i + 1,
                        hit.metadata.label(),
                        truncate_str(&hit.document, 300)
                    )
                })
                .collect();
            format!("{} result(s) for: {query}\n{blocks}", results.len())
        }
        OutputFormat::Json => {
            let json = serde_json::json!({
                "query": query,
                "count": results.len(),
                "results": results.hits(),
            });
            format.to_json(&json)
        }
    }
}

/// Truncates on a char boundary, appending `...` when shortened.
fn truncate_str(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

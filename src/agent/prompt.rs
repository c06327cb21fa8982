//! System prompt and user-message templates.
//!
//! The system prompt is fixed for the life of the process. It can be
//! replaced at startup by a `system.md` file in the prompt directory,
//! never per request.

use std::path::{Path, PathBuf};

/// Default system prompt for the course assistant.
pub const SYSTEM_PROMPT: &str = r"You are an assistant for course materials and educational content, with access to a search tool over the course catalog.

Search tool rules:
- Use the search tool for any question that could concern the course materials: courses, lessons, topics, concepts, examples, or assignments.
- Search at most once per query.
- Skip searching only for purely procedural questions, such as how to use this assistant.
- Build the answer from the search results and stay factual.
- When a search finds nothing, say so plainly and do not suggest alternatives.

Answer rules:
- Give the answer directly. Do not describe your reasoning, your searches, or the type of question.
- Never write phrases like 'based on the search results' or 'according to the search'.

Every answer must be brief and focused, instructive, written in plain language, and backed by an example when one helps understanding.
Answer only what was asked.";

/// Default prompt directory relative to the user's home.
const DEFAULT_PROMPT_DIR: &str = ".config/course-rag/prompts";

/// Filename of the system prompt override.
const SYSTEM_FILENAME: &str = "system.md";

/// Prompts used by the generation client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSet {
    /// System prompt.
    pub system: String,
}

impl Default for PromptSet {
    fn default() -> Self {
        Self::defaults()
    }
}

impl PromptSet {
    /// Loads prompts from the given directory, falling back to compiled-in defaults.
    ///
    /// Without an explicit directory, `~/.config/course-rag/prompts/` is
    /// tried. Missing or blank files use the default.
    #[must_use]
    pub fn load(prompt_dir: Option<&Path>) -> Self {
        let resolved_dir = prompt_dir.map(PathBuf::from).or_else(Self::default_dir);

        let system = resolved_dir
            .map(|dir| dir.join(SYSTEM_FILENAME))
            .and_then(|path| std::fs::read_to_string(path).ok())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| SYSTEM_PROMPT.to_string());

        Self { system }
    }

    /// Returns compiled-in defaults without checking the filesystem.
    #[must_use]
    pub fn defaults() -> Self {
        Self {
            system: SYSTEM_PROMPT.to_string(),
        }
    }

    /// Writes the default prompts into `dir`, skipping files that exist.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if directory creation or file writing fails.
    pub fn write_defaults(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)?;

        let mut written = Vec::new();
        let path = dir.join(SYSTEM_FILENAME);
        if !path.exists() {
            std::fs::write(&path, SYSTEM_PROMPT)?;
            written.push(path);
        }
        Ok(written)
    }

    /// Returns the default prompt directory under the user's home.
    #[must_use]
    pub fn default_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(DEFAULT_PROMPT_DIR))
    }
}

/// System message content: the prompt, plus rendered history when present.
#[must_use]
pub fn build_system_content(system_prompt: &str, history: Option<&str>) -> String {
    match history {
        Some(history) if !history.is_empty() => {
            format!("{system_prompt}\n\nPrevious conversation:\n{history}")
        }
        _ => system_prompt.to_string(),
    }
}

/// User message grounding the question in retrieved course content.
#[must_use]
pub fn build_context_prompt(context: &str, query: &str) -> String {
    format!(
        "Use the following course content to answer the question. Provide a direct, concise \
         answer without mentioning the sources or that you searched.\n\n\
         Course Content:\n{context}\n\nQuestion: {query}"
    )
}

/// User message when retrieval produced nothing usable.
#[must_use]
pub fn build_no_context_prompt(query: &str) -> String {
    format!(
        "Answer this question. If it's about course materials and no relevant content was \
         found, say so briefly.\n\nQuestion: {query}"
    )
}

/// User message in tool-driven mode.
#[must_use]
pub fn build_tool_prompt(query: &str) -> String {
    format!("Answer this question about course materials: {query}")
}

//! Search request/response types and citation sources.

use serde::{Deserialize, Serialize};

use crate::error::RetrievalError;

/// A retrieval request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    /// Free-text query.
    pub text: String,
    /// Optional course name filter (resolved to a course title by the backend).
    pub course_name: Option<String>,
    /// Optional lesson number filter.
    pub lesson_number: Option<u32>,
    /// Maximum hits to return. `None` uses the backend default.
    pub limit: Option<usize>,
}

impl SearchQuery {
    /// Creates an unfiltered query.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Restricts the search to one course.
    #[must_use]
    pub fn with_course(mut self, course_name: Option<String>) -> Self {
        self.course_name = course_name;
        self
    }

    /// Restricts the search to one lesson.
    #[must_use]
    pub const fn with_lesson(mut self, lesson_number: Option<u32>) -> Self {
        self.lesson_number = lesson_number;
        self
    }

    /// Caps the number of hits.
    #[must_use]
    pub const fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Metadata attached to every retrieved passage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Title of the course the passage belongs to.
    pub course_title: String,
    /// Lesson number, when the passage sits inside a lesson.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lesson_number: Option<u32>,
}

impl ChunkMetadata {
    /// Human-readable citation label: `"{course}"` or `"{course} - Lesson {n}"`.
    #[must_use]
    pub fn label(&self) -> String {
        match self.lesson_number {
            Some(n) => format!("{} - Lesson {n}", self.course_title),
            None => self.course_title.clone(),
        }
    }
}

/// One retrieved passage with its metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Passage text.
    pub document: String,
    /// Where the passage came from.
    pub metadata: ChunkMetadata,
}

/// The outcome of one retrieval call.
///
/// An errored result always has no hits; an empty result without an error
/// means "no matches".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResults {
    hits: Vec<SearchHit>,
    error: Option<RetrievalError>,
}

impl SearchResults {
    /// Builds a successful result set.
    #[must_use]
    pub const fn from_hits(hits: Vec<SearchHit>) -> Self {
        Self { hits, error: None }
    }

    /// Builds an empty, successful result set.
    #[must_use]
    pub const fn empty() -> Self {
        Self::from_hits(Vec::new())
    }

    /// Builds a failed result set.
    #[must_use]
    pub const fn failed(error: RetrievalError) -> Self {
        Self {
            hits: Vec::new(),
            error: Some(error),
        }
    }

    /// Retrieved passages in rank order.
    #[must_use]
    pub fn hits(&self) -> &[SearchHit] {
        &self.hits
    }

    /// The retrieval error, if the backend failed.
    #[must_use]
    pub const fn error(&self) -> Option<&RetrievalError> {
        self.error.as_ref()
    }

    /// Returns `true` when there are no passages (empty or failed).
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Number of passages.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.hits.len()
    }
}

/// A citation shown alongside an answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// Display label.
    pub text: String,
    /// Resolvable link, when the lesson has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl Source {
    /// Creates a source from passage metadata and an optional link.
    #[must_use]
    pub fn new(metadata: &ChunkMetadata, link: Option<String>) -> Self {
        Self {
            text: metadata.label(),
            link,
        }
    }
}

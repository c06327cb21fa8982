//! Retrieval contract and the `SQLite` course store behind it.
//!
//! The orchestration core only sees [`RetrievalGateway`] and
//! [`CourseCatalog`]; [`SqliteCourseStore`] is the bundled implementation
//! (FTS5 BM25 keyword ranking, no embeddings).

pub mod schema;
pub mod sqlite;

pub use sqlite::SqliteCourseStore;

use crate::core::{Course, CourseAnalytics, SearchQuery, SearchResults};
use crate::error::RetrievalError;

/// Default database location, relative to the working directory.
pub const DEFAULT_DB_PATH: &str = ".course-rag/courses.db";

/// Default number of passages returned per search.
pub const DEFAULT_MAX_RESULTS: usize = 5;

/// Search capability consumed by the orchestrator and the search tool.
///
/// Implementations never fail for "no results": failures are reported
/// through [`SearchResults::error`].
pub trait RetrievalGateway: Send + Sync {
    /// Runs a ranked search.
    fn search(&self, query: &SearchQuery) -> SearchResults;

    /// Best-effort lesson link lookup. Absence is not an error.
    fn lesson_link(&self, course_title: &str, lesson_number: u32) -> Option<String>;
}

/// Read access to course metadata.
pub trait CourseCatalog: Send + Sync {
    /// Resolves a (possibly partial) course name and returns the course
    /// with its lessons.
    fn course_outline(&self, course_name: &str) -> Result<Option<Course>, RetrievalError>;

    /// Catalog-level counts.
    fn analytics(&self) -> Result<CourseAnalytics, RetrievalError>;
}

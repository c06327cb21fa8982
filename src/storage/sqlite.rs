//! `SQLite` implementation of the course store.
//!
//! Passages are indexed in an FTS5 table and ranked with BM25. The
//! connection sits behind a mutex so the store can be shared between the
//! orchestrator, the search tool, and the MCP server.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, warn};
use unicode_segmentation::UnicodeSegmentation;

use super::schema::{CREATE_SCHEMA, SCHEMA_VERSION};
use super::{CourseCatalog, DEFAULT_MAX_RESULTS, RetrievalGateway};
use crate::core::{
    ChunkMetadata, Course, CourseAnalytics, CourseChunk, Lesson, SearchHit, SearchQuery,
    SearchResults,
};
use crate::error::{RetrievalError, StorageError};

/// Maximum distinct terms taken from a query when building the FTS match.
const MAX_QUERY_TERMS: usize = 32;

/// Course store backed by a single `SQLite` database.
pub struct SqliteCourseStore {
    conn: Mutex<Connection>,
    max_results: usize,
}

impl SqliteCourseStore {
    /// Opens (creating if needed) the database at `path`.
    pub fn open(path: &Path, max_results: usize) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|source| StorageError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        Self::with_connection(Connection::open(path)?, max_results)
    }

    /// Opens a throwaway in-memory database.
    pub fn in_memory() -> Result<Self, StorageError> {
        Self::with_connection(Connection::open_in_memory()?, DEFAULT_MAX_RESULTS)
    }

    fn with_connection(conn: Connection, max_results: usize) -> Result<Self, StorageError> {
        conn.execute_batch(CREATE_SCHEMA)?;
        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
        Ok(Self {
            conn: Mutex::new(conn),
            max_results: max_results.max(1),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores a course, its lessons, and its chunks, replacing any
    /// existing course with the same title.
    pub fn add_course(&self, course: &Course, chunks: &[CourseChunk]) -> Result<(), StorageError> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;

        tx.execute(
            "DELETE FROM chunks_fts WHERE rowid IN (SELECT id FROM chunks WHERE course_title = ?1)",
            params![course.title],
        )?;
        tx.execute("DELETE FROM courses WHERE title = ?1", params![course.title])?;

        tx.execute(
            "INSERT INTO courses (title, link, instructor) VALUES (?1, ?2, ?3)",
            params![course.title, course.link, course.instructor],
        )?;

        for lesson in &course.lessons {
            tx.execute(
                "INSERT OR REPLACE INTO lessons (course_title, lesson_number, title, link)
                 VALUES (?1, ?2, ?3, ?4)",
                params![course.title, lesson.number, lesson.title, lesson.link],
            )?;
        }

        for chunk in chunks {
            let index = i64::try_from(chunk.chunk_index).unwrap_or(i64::MAX);
            tx.execute(
                "INSERT INTO chunks (course_title, lesson_number, chunk_index, content)
                 VALUES (?1, ?2, ?3, ?4)",
                params![chunk.course_title, chunk.lesson_number, index, chunk.content],
            )?;
            let id = tx.last_insert_rowid();
            tx.execute(
                "INSERT INTO chunks_fts (rowid, content) VALUES (?1, ?2)",
                params![id, chunk.content],
            )?;
        }

        tx.commit()?;
        debug!(course = course.title, chunks = chunks.len(), "stored course");
        Ok(())
    }

    /// Titles of every stored course.
    pub fn course_titles(&self) -> Result<BTreeSet<String>, StorageError> {
        let conn = self.lock();
        let mut stmt = conn.prepare("SELECT title FROM courses")?;
        let titles = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(titles)
    }

    /// Number of stored courses.
    pub fn course_count(&self) -> Result<usize, StorageError> {
        self.count("SELECT COUNT(*) FROM courses")
    }

    /// Number of indexed chunks.
    pub fn chunk_count(&self) -> Result<usize, StorageError> {
        self.count("SELECT COUNT(*) FROM chunks")
    }

    fn count(&self, sql: &str) -> Result<usize, StorageError> {
        let n: i64 = self.lock().query_row(sql, [], |row| row.get(0))?;
        Ok(usize::try_from(n).unwrap_or(0))
    }

    /// Loads a course by exact title.
    pub fn get_course(&self, title: &str) -> Result<Option<Course>, StorageError> {
        let conn = self.lock();
        let course = conn
            .query_row(
                "SELECT title, link, instructor FROM courses WHERE title = ?1",
                params![title],
                |row| {
                    Ok(Course {
                        title: row.get(0)?,
                        link: row.get(1)?,
                        instructor: row.get(2)?,
                        lessons: Vec::new(),
                    })
                },
            )
            .optional()?;

        let Some(mut course) = course else {
            return Ok(None);
        };

        let mut stmt = conn.prepare(
            "SELECT lesson_number, title, link FROM lessons
             WHERE course_title = ?1 ORDER BY lesson_number",
        )?;
        course.lessons = stmt
            .query_map(params![title], |row| {
                Ok(Lesson {
                    number: row.get(0)?,
                    title: row.get(1)?,
                    link: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(course))
    }

    /// Resolves a user-supplied course name to a stored title.
    ///
    /// Case-insensitive exact match first, then the shortest title that
    /// contains the name.
    pub fn resolve_course_title(&self, name: &str) -> Result<Option<String>, StorageError> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(None);
        }
        let conn = self.lock();
        let exact = conn
            .query_row(
                "SELECT title FROM courses WHERE lower(title) = lower(?1)",
                params![name],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        if exact.is_some() {
            return Ok(exact);
        }
        let partial = conn
            .query_row(
                "SELECT title FROM courses WHERE instr(lower(title), lower(?1)) > 0
                 ORDER BY length(title), title LIMIT 1",
                params![name],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(partial)
    }

    /// Deletes every course, lesson, and chunk.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.lock().execute_batch(
            "DELETE FROM chunks_fts; DELETE FROM chunks; DELETE FROM lessons; DELETE FROM courses;",
        )?;
        Ok(())
    }

    fn ranked_hits(
        &self,
        match_expr: &str,
        course_title: Option<&str>,
        lesson_number: Option<u32>,
        limit: usize,
    ) -> Result<Vec<SearchHit>, StorageError> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT c.content, c.course_title, c.lesson_number
             FROM chunks_fts
             JOIN chunks c ON c.id = chunks_fts.rowid
             WHERE chunks_fts MATCH ?1
               AND (?2 IS NULL OR c.course_title = ?2)
               AND (?3 IS NULL OR c.lesson_number = ?3)
             ORDER BY bm25(chunks_fts)
             LIMIT ?4",
        )?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let hits = stmt
            .query_map(
                params![match_expr, course_title, lesson_number, limit],
                |row| {
                    Ok(SearchHit {
                        document: row.get(0)?,
                        metadata: ChunkMetadata {
                            course_title: row.get(1)?,
                            lesson_number: row.get(2)?,
                        },
                    })
                },
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(hits)
    }
}

impl RetrievalGateway for SqliteCourseStore {
    fn search(&self, query: &SearchQuery) -> SearchResults {
        let course_title = match query.course_name.as_deref() {
            Some(name) => match self.resolve_course_title(name) {
                Ok(Some(title)) => Some(title),
                Ok(None) => {
                    return SearchResults::failed(RetrievalError::CourseNotFound {
                        name: name.to_string(),
                    });
                }
                Err(e) => return SearchResults::failed(e.into()),
            },
            None => None,
        };

        let Some(match_expr) = fts_match_expression(&query.text) else {
            return SearchResults::empty();
        };

        let limit = query.limit.unwrap_or(self.max_results);
        match self.ranked_hits(
            &match_expr,
            course_title.as_deref(),
            query.lesson_number,
            limit,
        ) {
            Ok(hits) => {
                debug!(query = query.text, hits = hits.len(), "search complete");
                SearchResults::from_hits(hits)
            }
            Err(e) => {
                warn!(query = query.text, error = %e, "search failed");
                SearchResults::failed(e.into())
            }
        }
    }

    fn lesson_link(&self, course_title: &str, lesson_number: u32) -> Option<String> {
        self.lock()
            .query_row(
                "SELECT link FROM lessons WHERE course_title = ?1 AND lesson_number = ?2",
                params![course_title, lesson_number],
                |row| row.get::<_, Option<String>>(0),
            )
            .optional()
            .ok()
            .flatten()
            .flatten()
    }
}

impl CourseCatalog for SqliteCourseStore {
    fn course_outline(&self, course_name: &str) -> Result<Option<Course>, RetrievalError> {
        let Some(title) = self.resolve_course_title(course_name)? else {
            return Ok(None);
        };
        Ok(self.get_course(&title)?)
    }

    fn analytics(&self) -> Result<CourseAnalytics, RetrievalError> {
        let course_titles = self.course_titles()?;
        Ok(CourseAnalytics {
            total_courses: course_titles.len(),
            course_titles,
        })
    }
}

impl std::fmt::Debug for SqliteCourseStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteCourseStore")
            .field("conn", &"<rusqlite::Connection>")
            .field("max_results", &self.max_results)
            .finish()
    }
}

/// Turns free text into an FTS5 match expression: each distinct word is
/// quoted and the words are OR-ed so punctuation never reaches the FTS
/// query parser. Returns `None` when the text has no words.
fn fts_match_expression(text: &str) -> Option<String> {
    let mut seen = BTreeSet::new();
    let terms: Vec<String> = text
        .unicode_words()
        .map(str::to_lowercase)
        .filter(|w| seen.insert(w.clone()))
        .take(MAX_QUERY_TERMS)
        .map(|w| format!("\"{}\"", w.replace('"', "\"\"")))
        .collect();

    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" OR "))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn course(title: &str, lessons: &[(u32, &str, Option<&str>)]) -> Course {
        Course {
            title: title.to_string(),
            link: Some(format!("https://example.com/{}", title.to_lowercase())),
            instructor: Some("Ada".to_string()),
            lessons: lessons
                .iter()
                .map(|(n, t, l)| Lesson {
                    number: *n,
                    title: (*t).to_string(),
                    link: l.map(String::from),
                })
                .collect(),
        }
    }

    fn chunk(title: &str, lesson: Option<u32>, index: usize, content: &str) -> CourseChunk {
        CourseChunk {
            course_title: title.to_string(),
            lesson_number: lesson,
            chunk_index: index,
            content: content.to_string(),
        }
    }

    fn seeded_store() -> SqliteCourseStore {
        let store =
            SqliteCourseStore::in_memory().unwrap_or_else(|e| panic!("in_memory failed: {e}"));
        let cs101 = course(
            "CS101",
            &[
                (1, "Variables", None),
                (3, "Recursion", Some("https://example.com/cs101/3")),
            ],
        );
        store
            .add_course(
                &cs101,
                &[
                    chunk("CS101", Some(1), 0, "Variables hold values in memory."),
                    chunk("CS101", Some(3), 1, "Recursion is a function calling itself."),
                ],
            )
            .unwrap_or_else(|e| panic!("add_course failed: {e}"));
        let algo = course("Advanced Algorithms", &[(1, "Divide and conquer", None)]);
        store
            .add_course(
                &algo,
                &[chunk(
                    "Advanced Algorithms",
                    Some(1),
                    0,
                    "Merge sort uses recursion to divide the problem.",
                )],
            )
            .unwrap_or_else(|e| panic!("add_course failed: {e}"));
        store
    }

    #[test]
    fn test_search_finds_matching_passages() {
        let store = seeded_store();
        let results = store.search(&SearchQuery::new("What is recursion?"));
        assert!(results.error().is_none());
        assert_eq!(results.len(), 2);
        assert!(results.hits().iter().all(|h| h.document.contains("ecursion")));
    }

    #[test]
    fn test_search_course_filter_partial_name() {
        let store = seeded_store();
        let results =
            store.search(&SearchQuery::new("recursion").with_course(Some("algorithms".into())));
        assert_eq!(results.len(), 1);
        assert_eq!(results.hits()[0].metadata.course_title, "Advanced Algorithms");
    }

    #[test]
    fn test_search_lesson_filter() {
        let store = seeded_store();
        let results = store.search(
            &SearchQuery::new("recursion")
                .with_course(Some("cs101".into()))
                .with_lesson(Some(3)),
        );
        assert_eq!(results.len(), 1);
        assert_eq!(results.hits()[0].metadata.lesson_number, Some(3));
    }

    #[test]
    fn test_search_unknown_course_reports_error() {
        let store = seeded_store();
        let results =
            store.search(&SearchQuery::new("recursion").with_course(Some("Biology".into())));
        assert!(results.is_empty());
        assert!(matches!(
            results.error(),
            Some(RetrievalError::CourseNotFound { .. })
        ));
    }

    #[test]
    fn test_search_no_matches_is_not_an_error() {
        let store = seeded_store();
        let results = store.search(&SearchQuery::new("photosynthesis"));
        assert!(results.is_empty());
        assert!(results.error().is_none());
    }

    #[test]
    fn test_search_punctuation_only_query() {
        let store = seeded_store();
        let results = store.search(&SearchQuery::new("?!"));
        assert!(results.is_empty());
        assert!(results.error().is_none());
    }

    #[test]
    fn test_search_respects_limit() {
        let store = seeded_store();
        let results = store.search(&SearchQuery::new("recursion").with_limit(1));
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_lesson_link() {
        let store = seeded_store();
        assert_eq!(
            store.lesson_link("CS101", 3).as_deref(),
            Some("https://example.com/cs101/3")
        );
        assert!(store.lesson_link("CS101", 1).is_none());
        assert!(store.lesson_link("CS101", 9).is_none());
    }

    #[test]
    fn test_re_adding_course_replaces_chunks() {
        let store = seeded_store();
        let replacement = course("CS101", &[(1, "Loops", None)]);
        store
            .add_course(
                &replacement,
                &[chunk("CS101", Some(1), 0, "Loops repeat work.")],
            )
            .unwrap_or_else(|e| panic!("add_course failed: {e}"));
        assert_eq!(store.course_count().unwrap_or(0), 2);
        assert_eq!(store.chunk_count().unwrap_or(0), 2);
        let outline = store.get_course("CS101").ok().flatten();
        assert_eq!(outline.map(|c| c.lessons.len()), Some(1));
        let results = store.search(&SearchQuery::new("variables"));
        assert!(results.is_empty());
    }

    #[test]
    fn test_outline_and_analytics() {
        let store = seeded_store();
        let outline = store
            .course_outline("cs101")
            .unwrap_or_else(|e| panic!("outline failed: {e}"))
            .unwrap_or_else(|| panic!("course missing"));
        assert_eq!(outline.title, "CS101");
        assert_eq!(outline.lessons.len(), 2);
        assert_eq!(outline.lessons[1].number, 3);

        let analytics = store
            .analytics()
            .unwrap_or_else(|e| panic!("analytics failed: {e}"));
        assert_eq!(analytics.total_courses, 2);
        assert!(analytics.course_titles.contains("Advanced Algorithms"));
    }

    #[test]
    fn test_clear() {
        let store = seeded_store();
        store.clear().unwrap_or_else(|e| panic!("clear failed: {e}"));
        assert_eq!(store.course_count().unwrap_or(1), 0);
        assert!(store.search(&SearchQuery::new("recursion")).is_empty());
    }

    #[test]
    fn test_open_on_disk_creates_parent_dir() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir failed: {e}"));
        let path = dir.path().join("nested").join("courses.db");
        let store = SqliteCourseStore::open(&path, 3)
            .unwrap_or_else(|e| panic!("open failed: {e}"));
        assert_eq!(store.course_count().unwrap_or(1), 0);
        assert!(path.exists());
    }

    #[test]
    fn test_fts_match_expression() {
        assert_eq!(
            fts_match_expression("What is Recursion? what").as_deref(),
            Some("\"what\" OR \"is\" OR \"recursion\"")
        );
        assert!(fts_match_expression("  ... ").is_none());
    }
}

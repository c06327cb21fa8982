//! Course catalog records.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A lesson inside a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    /// Lesson number as written in the source document.
    pub number: u32,
    /// Lesson title.
    pub title: String,
    /// Link to the lesson, if published.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// A course and its lessons. The title is the course's unique key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    /// Course title.
    pub title: String,
    /// Course landing page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    /// Instructor name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructor: Option<String>,
    /// Lessons in document order.
    #[serde(default)]
    pub lessons: Vec<Lesson>,
}

impl Course {
    /// Creates a course with no lessons.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: None,
            instructor: None,
            lessons: Vec::new(),
        }
    }

    /// Looks up a lesson by number.
    #[must_use]
    pub fn lesson(&self, number: u32) -> Option<&Lesson> {
        self.lessons.iter().find(|l| l.number == number)
    }
}

/// A piece of course text ready for indexing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseChunk {
    /// Owning course title.
    pub course_title: String,
    /// Lesson the text belongs to, if any.
    pub lesson_number: Option<u32>,
    /// Position of the chunk within the course (0-based).
    pub chunk_index: usize,
    /// Chunk text.
    pub content: String,
}

/// Catalog-level counts for the analytics read model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseAnalytics {
    /// Number of courses in the catalog.
    pub total_courses: usize,
    /// All course titles.
    pub course_titles: BTreeSet<String>,
}

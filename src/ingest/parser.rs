//! Course document parser.
//!
//! Documents are plain text. Optional header lines come first:
//!
//! ```text
//! Course Title: Intro to Rust
//! Course Link: https://example.com/rust
//! Course Instructor: Ada
//!
//! Lesson 0: Welcome
//! Lesson Link: https://example.com/rust/0
//! Lesson body text...
//! ```
//!
//! When no `Course Title:` header exists, the first non-empty line is the
//! title. Text before the first `Lesson N:` marker belongs to the course
//! without a lesson number.

use std::sync::LazyLock;

use regex::Regex;

use crate::core::{Course, Lesson};

#[allow(clippy::expect_used)]
static HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^course\s+(title|link|instructor)\s*:\s*(.*)$")
        .expect("header regex is valid")
});

#[allow(clippy::expect_used)]
static LESSON_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^lesson\s+(\d+)\s*:\s*(.*)$").expect("lesson regex is valid")
});

#[allow(clippy::expect_used)]
static LESSON_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^lesson\s+link\s*:\s*(.*)$").expect("lesson link regex is valid")
});

/// A course document split into its catalog record and text sections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDocument {
    /// Course record with lessons.
    pub course: Course,
    /// Text sections in document order, tagged with their lesson number.
    pub sections: Vec<Section>,
}

/// A run of body text belonging to one lesson (or to no lesson).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Lesson number, `None` for course-level text.
    pub lesson_number: Option<u32>,
    /// Body text.
    pub text: String,
}

/// Parses a course document. Returns `None` when no title can be found.
#[must_use]
pub fn parse_document(content: &str) -> Option<ParsedDocument> {
    let mut title: Option<String> = None;
    let mut link = None;
    let mut instructor = None;
    let mut lessons: Vec<Lesson> = Vec::new();
    let mut sections: Vec<Section> = Vec::new();
    let mut body: Vec<&str> = Vec::new();
    let mut current_lesson: Option<u32> = None;
    let mut in_header = true;

    for raw in content.lines() {
        let line = raw.trim();

        if in_header {
            if let Some(caps) = HEADER_RE.captures(line) {
                let value = non_empty(&caps[2]);
                match caps[1].to_ascii_lowercase().as_str() {
                    "title" => title = value,
                    "link" => link = value,
                    _ => instructor = value,
                }
                continue;
            }
            if line.is_empty() {
                continue;
            }
            if title.is_none() && !LESSON_RE.is_match(line) {
                title = Some(line.to_string());
                in_header = false;
                continue;
            }
            in_header = false;
        }

        if let Some(caps) = LESSON_RE.captures(line) {
            flush(&mut sections, current_lesson, &mut body);
            let Ok(number) = caps[1].parse::<u32>() else {
                body.push(line);
                continue;
            };
            current_lesson = Some(number);
            lessons.retain(|l| l.number != number);
            lessons.push(Lesson {
                number,
                title: caps[2].trim().to_string(),
                link: None,
            });
            continue;
        }

        if let Some(caps) = LESSON_LINK_RE.captures(line)
            && let Some(lesson) = current_lesson.and_then(|n| lessons.iter_mut().find(|l| l.number == n))
            && lesson.link.is_none()
        {
            lesson.link = non_empty(&caps[1]);
            continue;
        }

        body.push(raw);
    }
    flush(&mut sections, current_lesson, &mut body);

    let title = title?;
    lessons.sort_by_key(|l| l.number);
    Some(ParsedDocument {
        course: Course {
            title,
            link,
            instructor,
            lessons,
        },
        sections,
    })
}

fn flush(sections: &mut Vec<Section>, lesson_number: Option<u32>, body: &mut Vec<&str>) {
    let text = body.join("\n").trim().to_string();
    body.clear();
    if !text.is_empty() {
        sections.push(Section {
            lesson_number,
            text,
        });
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

//! Database schema for the course store.

/// Current schema version, stored in `user_version`.
pub const SCHEMA_VERSION: i32 = 1;

/// Creates all tables if they do not exist.
///
/// `chunks_fts` shares rowids with `chunks` so ranked hits can be joined
/// back to their metadata.
pub const CREATE_SCHEMA: &str = r"
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS courses (
    title       TEXT PRIMARY KEY,
    link        TEXT,
    instructor  TEXT
);

CREATE TABLE IF NOT EXISTS lessons (
    course_title   TEXT NOT NULL REFERENCES courses(title) ON DELETE CASCADE,
    lesson_number  INTEGER NOT NULL,
    title          TEXT NOT NULL,
    link           TEXT,
    PRIMARY KEY (course_title, lesson_number)
);

CREATE TABLE IF NOT EXISTS chunks (
    id             INTEGER PRIMARY KEY,
    course_title   TEXT NOT NULL REFERENCES courses(title) ON DELETE CASCADE,
    lesson_number  INTEGER,
    chunk_index    INTEGER NOT NULL,
    content        TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_chunks_course ON chunks(course_title, lesson_number);

CREATE VIRTUAL TABLE IF NOT EXISTS chunks_fts USING fts5(
    content,
    tokenize = 'porter unicode61'
);
";

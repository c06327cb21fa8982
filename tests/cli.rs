//! Binary integration tests. None of these reach a generation backend.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const CS101: &str = "Course Title: CS101\n\
Course Link: https://example.com/cs101\n\
Course Instructor: Ada Lovelace\n\
Lesson 1: Variables\n\
Lesson Link: https://example.com/cs101/1\n\
A variable names a value. Values can change over time.\n\
Lesson 3: Recursion\n\
Lesson Link: https://example.com/cs101/3\n\
Recursion is when a function calls itself. Every recursive function needs a base case.\n";

const ALGO: &str = "Course Title: Algorithms\n\
Lesson 1: Sorting\n\
Merge sort splits the input in half and merges sorted halves.\n";

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let docs = dir.path().join("docs");
        std::fs::create_dir(&docs).unwrap();
        std::fs::write(docs.join("cs101.txt"), CS101).unwrap();
        std::fs::write(docs.join("algorithms.md"), ALGO).unwrap();
        std::fs::write(docs.join("notes.pdf"), "ignored").unwrap();
        Self { dir }
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("course-rag").unwrap();
        cmd.current_dir(self.dir.path())
            .env("HOME", self.dir.path())
            .env_remove("OPENAI_API_KEY")
            .env_remove("COURSE_RAG_API_KEY")
            .env_remove("OPENAI_BASE_URL")
            .env_remove("COURSE_RAG_BASE_URL")
            .env_remove("COURSE_RAG_RETRIEVAL_MODE")
            .env_remove("RUST_LOG")
            .env("COURSE_RAG_DB_PATH", self.dir.path().join("courses.db"));
        cmd
    }

    fn ingest(&self) {
        self.cmd().args(["ingest", "docs"]).assert().success();
    }
}

#[test]
fn test_help_lists_commands() {
    Command::cargo_bin("course-rag")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("ingest"))
        .stdout(predicate::str::contains("query"))
        .stdout(predicate::str::contains("analytics"));
}

#[test]
fn test_ingest_reports_counts() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["ingest", "docs"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Ingested 2 course(s)"));

    ws.cmd()
        .args(["ingest", "docs"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Ingested 0 course(s)"));
}

#[test]
fn test_ingest_missing_folder_fails() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["ingest", "missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("folder does not exist"));
}

#[test]
fn test_analytics_json() {
    let ws = Workspace::new();
    ws.ingest();
    let output = ws
        .cmd()
        .args(["--format", "json", "analytics"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["total_courses"], 2);
    assert_eq!(value["course_titles"][0], "Algorithms");
    assert_eq!(value["course_titles"][1], "CS101");
}

#[test]
fn test_outline_partial_name() {
    let ws = Workspace::new();
    ws.ingest();
    ws.cmd()
        .args(["outline", "algo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Course: Algorithms"))
        .stdout(predicate::str::contains("1. Sorting"));
}

#[test]
fn test_search_with_lesson_filter() {
    let ws = Workspace::new();
    ws.ingest();
    ws.cmd()
        .args(["search", "recursive base case", "--course", "CS101", "--lesson", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("CS101 - Lesson 3"))
        .stdout(predicate::str::contains("Lesson 1").not());
}

#[test]
fn test_search_unknown_course_fails() {
    let ws = Workspace::new();
    ws.ingest();
    ws.cmd()
        .args(["search", "anything", "--course", "Biology"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no course found matching 'Biology'"));
}

#[test]
fn test_add_single_document() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["add", "docs/cs101.txt"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added course 'CS101' (2 lesson(s)"));
}

#[test]
fn test_init_prompts_writes_template() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["init-prompts", "--dir", "prompts"])
        .assert()
        .success()
        .stdout(predicate::str::contains("system.md"));
    assert!(ws.dir.path().join("prompts/system.md").exists());
}

#[test]
fn test_query_without_api_key_fails() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["query", "What is recursion?"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("API key missing"));
}

#[test]
fn test_invalid_mode_rejected() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["query", "q", "--mode", "telepathy"])
        .assert()
        .failure();
}

//! Course document ingestion: parsing, chunking, and folder loading.
//!
//! Folder ingestion parses documents in parallel with rayon; callers write
//! the results to the store sequentially.

pub mod chunker;
pub mod parser;

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::debug;

pub use chunker::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE, SentenceChunker};
pub use parser::{ParsedDocument, Section, parse_document};

use crate::core::{Course, CourseChunk};
use crate::error::IngestError;

/// File extensions picked up by folder ingestion.
pub const COURSE_FILE_EXTENSIONS: &[&str] = &["txt", "md"];

/// A parsed course together with its chunks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedCourse {
    /// Catalog record.
    pub course: Course,
    /// Chunks in document order with a course-wide index.
    pub chunks: Vec<CourseChunk>,
}

/// Parses document text and chunks every section.
///
/// # Errors
///
/// Returns [`IngestError::MissingTitle`] when the document has no title.
pub fn load_course_text(
    content: &str,
    path: &Path,
    chunker: &SentenceChunker,
) -> Result<LoadedCourse, IngestError> {
    let ParsedDocument { course, sections } =
        parse_document(content).ok_or_else(|| IngestError::MissingTitle {
            path: path.to_path_buf(),
        })?;

    let chunks: Vec<CourseChunk> = sections
        .iter()
        .flat_map(|section| {
            chunker
                .chunk(&section.text)
                .into_iter()
                .map(move |text| (section.lesson_number, text))
        })
        .enumerate()
        .map(|(chunk_index, (lesson_number, content))| CourseChunk {
            course_title: course.title.clone(),
            lesson_number,
            chunk_index,
            content,
        })
        .collect();

    debug!(
        path = %path.display(),
        course = course.title,
        chunks = chunks.len(),
        "parsed course document"
    );
    Ok(LoadedCourse { course, chunks })
}

/// Reads and parses a single course file.
///
/// # Errors
///
/// Returns [`IngestError::Io`] when the file cannot be read and
/// [`IngestError::MissingTitle`] when it has no title.
pub fn load_course_file(path: &Path, chunker: &SentenceChunker) -> Result<LoadedCourse, IngestError> {
    let content = std::fs::read_to_string(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_course_text(&content, path, chunker)
}

/// Lists course files directly inside `dir`, sorted by path.
///
/// # Errors
///
/// Returns [`IngestError::FolderNotFound`] when `dir` is not a directory.
pub fn course_files(dir: &Path) -> Result<Vec<PathBuf>, IngestError> {
    if !dir.is_dir() {
        return Err(IngestError::FolderNotFound {
            path: dir.to_path_buf(),
        });
    }
    let entries = std::fs::read_dir(dir).map_err(|source| IngestError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && has_course_extension(p))
        .collect();
    files.sort();
    Ok(files)
}

/// Parses every course file in `dir` in parallel.
///
/// Per-file failures are returned alongside the file path so one bad
/// document does not stop the rest.
///
/// # Errors
///
/// Fails only when the folder itself cannot be listed.
pub fn load_course_folder(
    dir: &Path,
    chunker: &SentenceChunker,
) -> Result<Vec<(PathBuf, Result<LoadedCourse, IngestError>)>, IngestError> {
    let files = course_files(dir)?;
    Ok(files
        .into_par_iter()
        .map(|path| {
            let loaded = load_course_file(&path, chunker);
            (path, loaded)
        })
        .collect())
}

fn has_course_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            COURSE_FILE_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        })
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, content: &str) {
        std::fs::write(dir.join(name), content).unwrap_or_else(|e| panic!("write failed: {e}"));
    }

    #[test]
    fn test_chunk_indices_run_across_sections() {
        let text = "Course Title: T\nIntro text.\nLesson 1: A\nFirst lesson.\nLesson 2: B\nSecond lesson.";
        let loaded = load_course_text(text, Path::new("t.txt"), &SentenceChunker::default())
            .unwrap_or_else(|e| panic!("load failed: {e}"));
        let indices: Vec<usize> = loaded.chunks.iter().map(|c| c.chunk_index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        let lessons: Vec<Option<u32>> = loaded.chunks.iter().map(|c| c.lesson_number).collect();
        assert_eq!(lessons, vec![None, Some(1), Some(2)]);
        assert!(loaded.chunks.iter().all(|c| c.course_title == "T"));
    }

    #[test]
    fn test_missing_title_error() {
        let err = load_course_text("", Path::new("empty.txt"), &SentenceChunker::default());
        assert!(matches!(err, Err(IngestError::MissingTitle { .. })));
    }

    #[test]
    fn test_missing_file() {
        let err = load_course_file(Path::new("/nonexistent/course.txt"), &SentenceChunker::default());
        assert!(matches!(err, Err(IngestError::Io { .. })));
    }

    #[test]
    fn test_course_files_filters_extensions() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir failed: {e}"));
        write(dir.path(), "b.txt", "Course Title: B");
        write(dir.path(), "a.MD", "Course Title: A");
        write(dir.path(), "notes.pdf", "binary");
        let files = course_files(dir.path()).unwrap_or_else(|e| panic!("list failed: {e}"));
        let names: Vec<String> = files
            .iter()
            .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect();
        assert_eq!(names, vec!["a.MD".to_string(), "b.txt".to_string()]);
    }

    #[test]
    fn test_folder_not_found() {
        let err = course_files(Path::new("/nonexistent/folder"));
        assert!(matches!(err, Err(IngestError::FolderNotFound { .. })));
    }

    #[test]
    fn test_load_course_folder_keeps_per_file_errors() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir failed: {e}"));
        write(dir.path(), "good.txt", "Course Title: Good\nLesson 1: One\nBody.");
        write(dir.path(), "empty.txt", "");
        let results = load_course_folder(dir.path(), &SentenceChunker::default())
            .unwrap_or_else(|e| panic!("folder failed: {e}"));
        assert_eq!(results.len(), 2);
        assert!(results[0].1.is_err());
        assert!(results[1].1.is_ok());
    }
}

//! # course-rag
//!
//! Retrieval-augmented question answering over course material.
//!
//! Course documents are parsed into courses and lessons, chunked on
//! sentence boundaries, and indexed in a local `SQLite` FTS5 store. Each
//! query is grounded in one of two ways, fixed per assistant:
//!
//! - **Pre-retrieval**: search with the raw query, then generate an answer
//!   from the retrieved passages.
//! - **Tool-driven**: advertise `search_course_content` and
//!   `get_course_outline` as tools and let the model run at most one tool
//!   round.
//!
//! Sessions keep the last few exchanges so follow-up questions have
//! context. Answers come back with citation sources (`"CS101 - Lesson 3"`
//! plus the lesson link when one exists).
//!
//! ## Example
//!
//! ```no_run
//! use course_rag::{CourseAssistant, RagConfig};
//!
//! # async fn run() -> Result<(), course_rag::Error> {
//! let config = RagConfig::from_env()?;
//! let assistant = CourseAssistant::from_config(&config)?;
//! assistant.add_course_folder(std::path::Path::new("docs"), false)?;
//!
//! let session = assistant.create_session();
//! let answer = assistant.query("What is covered in lesson 3 of CS101?", Some(&session)).await?;
//! println!("{}", answer.answer);
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod assistant;
pub mod cli;
pub mod core;
pub mod error;
pub mod ingest;
#[cfg(feature = "mcp")]
pub mod mcp;
pub mod session;
pub mod storage;

pub use agent::{QueryAnswer, RagConfig, RetrievalMode};
pub use assistant::{CourseAssistant, CourseLibrary};
pub use core::{Course, CourseAnalytics, Lesson, SearchQuery, SearchResults, Source};
pub use error::{Error, Result};
pub use session::SessionStore;
pub use storage::SqliteCourseStore;

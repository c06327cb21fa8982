//! Core data types shared across retrieval, tools, and orchestration.
//!
//! These types carry no I/O: search results, citation sources, and the
//! course catalog records produced by ingestion.

pub mod course;
pub mod search;

pub use course::{Course, CourseAnalytics, CourseChunk, Lesson};
pub use search::{ChunkMetadata, SearchHit, SearchQuery, SearchResults, Source};

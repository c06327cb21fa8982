//! Facades wiring the course store, ingestion, and the query orchestrator.
//!
//! [`CourseLibrary`] covers everything that works offline (ingestion,
//! analytics, search). [`CourseAssistant`] adds generation on top.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::agent::{
    GenerationClient, GenerationSettings, LlmProvider, PreRetrieval, PromptSet, QueryAnswer,
    QueryOrchestrator, RagConfig, RetrievalMode, RetrievalStrategy, StoreConfig, ToolDriven,
    create_provider,
};
use crate::core::{Course, CourseAnalytics, SearchQuery, SearchResults};
use crate::error::{Error, IngestError, QueryError, RetrievalError, StorageError};
use crate::ingest::{SentenceChunker, load_course_file, load_course_folder};
use crate::session::SessionStore;
use crate::storage::{CourseCatalog, RetrievalGateway, SqliteCourseStore};

/// Course store plus the chunker used to fill it.
#[derive(Debug, Clone)]
pub struct CourseLibrary {
    store: Arc<SqliteCourseStore>,
    chunker: SentenceChunker,
}

impl CourseLibrary {
    /// Wraps an existing store.
    #[must_use]
    pub const fn new(store: Arc<SqliteCourseStore>, chunker: SentenceChunker) -> Self {
        Self { store, chunker }
    }

    /// Opens the store described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the database cannot be opened.
    pub fn open(config: &StoreConfig) -> Result<Self, StorageError> {
        let store = SqliteCourseStore::open(&config.db_path, config.max_results)?;
        Ok(Self::new(
            Arc::new(store),
            SentenceChunker::new(config.chunk_size, config.chunk_overlap),
        ))
    }

    /// Underlying store.
    #[must_use]
    pub const fn store(&self) -> &Arc<SqliteCourseStore> {
        &self.store
    }

    /// Ingests one course document, replacing a course with the same title.
    ///
    /// Returns the course and the number of chunks stored.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError`] when the file cannot be read, has no title,
    /// or cannot be stored.
    pub fn add_course_document(&self, path: &Path) -> Result<(Course, usize), IngestError> {
        let loaded = load_course_file(path, &self.chunker)?;
        self.store.add_course(&loaded.course, &loaded.chunks)?;
        info!(
            course = loaded.course.title,
            chunks = loaded.chunks.len(),
            "course added"
        );
        Ok((loaded.course, loaded.chunks.len()))
    }

    /// Ingests every `.txt`/`.md` file in a folder.
    ///
    /// Courses whose title is already stored are skipped; unreadable or
    /// untitled files are logged and skipped. Returns `(courses, chunks)`
    /// added.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::FolderNotFound`] for a missing folder and
    /// [`IngestError::Storage`] when the store fails.
    pub fn add_course_folder(
        &self,
        folder: &Path,
        clear_existing: bool,
    ) -> Result<(usize, usize), IngestError> {
        let documents = load_course_folder(folder, &self.chunker)?;

        if clear_existing {
            info!("clearing existing course data");
            self.store.clear()?;
        }
        let mut existing: BTreeSet<String> = self.store.course_titles()?;

        let mut total_courses = 0;
        let mut total_chunks = 0;
        for (path, loaded) in documents {
            let loaded = match loaded {
                Ok(loaded) => loaded,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping course document");
                    continue;
                }
            };
            if !existing.insert(loaded.course.title.clone()) {
                info!(course = loaded.course.title, "course already exists, skipping");
                continue;
            }
            self.store.add_course(&loaded.course, &loaded.chunks)?;
            total_courses += 1;
            total_chunks += loaded.chunks.len();
        }

        info!(
            folder = %folder.display(),
            courses = total_courses,
            chunks = total_chunks,
            "folder ingested"
        );
        Ok((total_courses, total_chunks))
    }

    /// Catalog counts.
    ///
    /// # Errors
    ///
    /// Returns [`RetrievalError`] when the store fails.
    pub fn analytics(&self) -> Result<CourseAnalytics, RetrievalError> {
        self.store.analytics()
    }

    /// Outline of a course matched by name.
    ///
    /// # Errors
    ///
    /// Returns [`RetrievalError`] when the store fails.
    pub fn outline(&self, course_name: &str) -> Result<Option<Course>, RetrievalError> {
        self.store.course_outline(course_name)
    }

    /// Raw passage search.
    #[must_use]
    pub fn search(&self, query: &SearchQuery) -> SearchResults {
        self.store.search(query)
    }
}

/// Full assistant: library, sessions, and the query orchestrator.
#[derive(Debug)]
pub struct CourseAssistant {
    library: CourseLibrary,
    orchestrator: QueryOrchestrator,
}

impl CourseAssistant {
    /// Builds an assistant from configuration: opens the store, creates the
    /// provider, and loads the system prompt.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] or [`Error::Config`] when either cannot
    /// be created.
    pub fn from_config(config: &RagConfig) -> Result<Self, Error> {
        let library = CourseLibrary::open(&config.store)?;
        let provider: Arc<dyn LlmProvider> = Arc::from(create_provider(config)?);
        Ok(Self::new(library, provider, config))
    }

    /// Builds an assistant over an existing library and provider.
    #[must_use]
    pub fn new(library: CourseLibrary, provider: Arc<dyn LlmProvider>, config: &RagConfig) -> Self {
        let prompts = PromptSet::load(config.prompt_dir.as_deref());
        let client = GenerationClient::new(
            provider,
            GenerationSettings::from_config(config),
            prompts.system,
        );

        let store = library.store().clone();
        let strategy: Box<dyn RetrievalStrategy> = match config.retrieval_mode {
            RetrievalMode::PreRetrieval => Box::new(PreRetrieval::new(store, None)),
            RetrievalMode::ToolDriven => {
                Box::new(ToolDriven::with_course_tools(store.clone(), store))
            }
        };

        let sessions = Arc::new(SessionStore::new(config.max_history));
        Self {
            library,
            orchestrator: QueryOrchestrator::new(client, strategy, sessions),
        }
    }

    /// Answers a query, optionally within a session.
    ///
    /// # Errors
    ///
    /// See [`QueryOrchestrator::query`].
    pub async fn query(
        &self,
        query: &str,
        session_id: Option<&str>,
    ) -> Result<QueryAnswer, QueryError> {
        self.orchestrator.query(query, session_id).await
    }

    /// Mints a new session id.
    pub fn create_session(&self) -> String {
        self.orchestrator.sessions().create_session()
    }

    /// Forgets a session.
    pub fn clear_session(&self, session_id: &str) {
        self.orchestrator.sessions().clear_session(session_id);
    }

    /// Active retrieval mode.
    #[must_use]
    pub fn mode(&self) -> RetrievalMode {
        self.orchestrator.mode()
    }

    /// Course library.
    #[must_use]
    pub const fn library(&self) -> &CourseLibrary {
        &self.library
    }

    /// Session store.
    #[must_use]
    pub const fn sessions(&self) -> &Arc<SessionStore> {
        self.orchestrator.sessions()
    }

    /// See [`CourseLibrary::add_course_document`].
    ///
    /// # Errors
    ///
    /// Returns [`IngestError`] on read, parse, or storage failure.
    pub fn add_course_document(&self, path: &Path) -> Result<(Course, usize), IngestError> {
        self.library.add_course_document(path)
    }

    /// See [`CourseLibrary::add_course_folder`].
    ///
    /// # Errors
    ///
    /// Returns [`IngestError`] on a missing folder or storage failure.
    pub fn add_course_folder(
        &self,
        folder: &Path,
        clear_existing: bool,
    ) -> Result<(usize, usize), IngestError> {
        self.library.add_course_folder(folder, clear_existing)
    }

    /// Catalog counts.
    ///
    /// # Errors
    ///
    /// Returns [`RetrievalError`] when the store fails.
    pub fn analytics(&self) -> Result<CourseAnalytics, RetrievalError> {
        self.library.analytics()
    }
}

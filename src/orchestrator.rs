//! RAG orchestrator for Pensum.
//!
//! Wires the course store, embedder, generator, tools and session
//! memory together and exposes the query and ingestion operations the
//! CLI and HTTP API are built on.

use crate::agent::{CourseOutlineTool, CourseSearchTool, Generator, SourceRecord, ToolRegistry};
use crate::config::{EmbeddingProvider, Settings};
use crate::document::{self, ChunkingConfig};
use crate::embedding::{Embedder, HashedNgramEmbedder, OpenAIEmbedder};
use crate::error::{PensumError, Result};
use crate::llm::AnthropicClient;
use crate::session::SessionManager;
use crate::store::{Course, CourseStore, SqliteCourseStore};
use serde::Serialize;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// The main orchestrator for answering queries over course materials.
pub struct RagSystem {
    settings: Settings,
    store: Arc<dyn CourseStore>,
    generator: Option<Generator>,
    sessions: SessionManager,
}

impl RagSystem {
    /// Create a system from settings, wiring the default components.
    ///
    /// Requires `ANTHROPIC_API_KEY` unless demo mode is enabled, and
    /// `OPENAI_API_KEY` when the openai embedding provider is selected.
    pub fn new(settings: Settings) -> Result<Self> {
        let store = Self::open_store(&settings)?;

        let generator = if settings.demo.enabled {
            info!("Demo mode enabled, queries bypass the LLM");
            None
        } else {
            let api_key = std::env::var("ANTHROPIC_API_KEY").map_err(|_| {
                PensumError::Config("ANTHROPIC_API_KEY environment variable not set".to_string())
            })?;
            let mut client = AnthropicClient::new(api_key, &settings.generator.model)?
                .with_max_tokens(settings.generator.max_tokens);
            if let Some(base_url) = &settings.generator.base_url {
                client = client.with_base_url(base_url);
            }
            Some(Generator::new(Arc::new(client)))
        };

        Ok(Self::with_components(settings, store, generator))
    }

    /// Open the configured course store without a completion client.
    /// Commands that only read or build the index use this directly.
    pub fn open_store(settings: &Settings) -> Result<Arc<dyn CourseStore>> {
        let embedder: Arc<dyn Embedder> = match settings.embedding.provider {
            EmbeddingProvider::Openai => Arc::new(OpenAIEmbedder::with_config(
                &settings.embedding.model,
                settings.embedding.dimensions as usize,
            )),
            EmbeddingProvider::Offline => {
                info!("Using offline embeddings, no embedding API traffic");
                Arc::new(HashedNgramEmbedder::with_dimensions(
                    settings.embedding.dimensions as usize,
                ))
            }
        };

        Ok(Arc::new(
            SqliteCourseStore::new(&settings.database_path(), embedder)?
                .with_max_results(settings.search.max_results),
        ))
    }

    /// Create a system with custom components. `None` for the generator
    /// puts the system in demo mode.
    pub fn with_components(
        settings: Settings,
        store: Arc<dyn CourseStore>,
        generator: Option<Generator>,
    ) -> Self {
        let sessions = SessionManager::new().with_max_history(settings.session.max_history);

        Self {
            settings,
            store,
            generator,
            sessions,
        }
    }

    /// Assemble the retrieval tools for one query. Every query gets its
    /// own registry, so source records from concurrent queries cannot
    /// interleave.
    fn build_registry(&self) -> Result<ToolRegistry> {
        let mut registry = ToolRegistry::new();
        registry.register_tool(Box::new(CourseSearchTool::new(Arc::clone(&self.store))))?;
        registry.register_tool(Box::new(CourseOutlineTool::new(Arc::clone(&self.store))))?;
        Ok(registry)
    }

    /// Get a reference to the course store.
    pub fn store(&self) -> Arc<dyn CourseStore> {
        self.store.clone()
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Start a fresh conversation session.
    pub fn create_session(&self) -> String {
        self.sessions.create_session()
    }

    /// Forget a conversation session.
    pub fn clear_session(&self, session_id: &str) {
        self.sessions.clear_session(session_id);
    }

    /// Answer one query, returning the answer text and the sources the
    /// tools consulted, in tool registration order.
    ///
    /// With a session id, prior exchanges are threaded into the prompt
    /// and this exchange is recorded afterwards.
    #[instrument(skip(self, session_id), fields(query = %query))]
    pub async fn query(
        &self,
        query: &str,
        session_id: Option<&str>,
    ) -> Result<(String, Vec<SourceRecord>)> {
        let registry = self.build_registry()?;

        let answer = match &self.generator {
            Some(generator) => {
                let history = session_id.and_then(|id| self.sessions.get_history(id));
                let prompt = format!("Answer this question about course materials: {}", query);
                let tools = registry.get_tool_definitions();
                generator
                    .generate(&prompt, history.as_deref(), Some(&tools), Some(&registry))
                    .await?
            }
            None => Self::demo_answer(&registry, query).await,
        };

        let sources = registry.get_last_sources();

        if let Some(id) = session_id {
            self.sessions.add_exchange(id, query, &answer);
        }

        Ok((answer, sources))
    }

    /// Smoke-test path: answer straight from the search tool, no LLM
    /// traffic.
    async fn demo_answer(registry: &ToolRegistry, query: &str) -> String {
        let output = registry
            .execute_tool("search_course_content", &json!({ "query": query }))
            .await;
        format!(
            "[Demo Mode] The LLM is disabled; showing raw search results for \"{}\":\n\n{}",
            query, output
        )
    }

    /// Parse one course document and index it. Returns the course and
    /// the number of chunks indexed.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn add_course_document(&self, path: &Path) -> Result<(Course, usize)> {
        let (course, chunks) = document::process_document(path, &self.chunking_config())?;

        self.store.add_course(&course).await?;
        let indexed = self.store.add_chunks(&chunks).await?;
        info!(course = %course.title, chunks = indexed, "indexed course document");

        Ok((course, indexed))
    }

    /// Ingest every course document in a folder, skipping courses whose
    /// title is already indexed. Unreadable documents are logged and
    /// counted, not fatal.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn add_course_folder(&self, path: &Path, clear: bool) -> Result<IngestResult> {
        if clear {
            self.store.clear_all().await?;
            info!("Cleared existing course data");
        }

        let mut existing = self.store.course_titles().await?;
        let mut result = IngestResult::default();

        let mut files: Vec<_> = std::fs::read_dir(path)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|p| is_course_file(p))
            .collect();
        files.sort();

        for file_path in files {
            match document::process_document(&file_path, &self.chunking_config()) {
                Ok((course, chunks)) => {
                    if existing.contains(&course.title) {
                        debug!(course = %course.title, "already indexed, skipping");
                        result.skipped += 1;
                        continue;
                    }
                    self.store.add_course(&course).await?;
                    result.chunks_indexed += self.store.add_chunks(&chunks).await?;
                    result.courses_added += 1;
                    existing.push(course.title);
                }
                Err(e) => {
                    warn!(path = %file_path.display(), error = %e, "failed to process document");
                    result.failed += 1;
                }
            }
        }

        Ok(result)
    }

    /// Course count and titles, for the API and CLI.
    pub async fn get_course_analytics(&self) -> Result<CourseAnalytics> {
        Ok(CourseAnalytics {
            total_courses: self.store.course_count().await?,
            course_titles: self.store.course_titles().await?,
        })
    }

    fn chunking_config(&self) -> ChunkingConfig {
        ChunkingConfig {
            chunk_size: self.settings.chunking.chunk_size,
            chunk_overlap: self.settings.chunking.chunk_overlap,
        }
    }
}

fn is_course_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("txt") | Some("md")
    )
}

/// Result of a folder ingest.
#[derive(Debug, Default, PartialEq)]
pub struct IngestResult {
    /// Courses newly indexed.
    pub courses_added: usize,
    /// Chunks embedded and stored.
    pub chunks_indexed: usize,
    /// Documents skipped because their course was already indexed.
    pub skipped: usize,
    /// Documents that failed to parse.
    pub failed: usize,
}

/// Knowledge-base overview.
#[derive(Debug, Clone, Serialize)]
pub struct CourseAnalytics {
    pub total_courses: usize,
    pub course_titles: Vec<String>,
}

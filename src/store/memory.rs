//! In-memory course store implementation.
//!
//! Useful for testing and demo mode.

use super::{cosine_similarity, Course, CourseChunk, CourseStore, SearchHit, DEFAULT_MAX_RESULTS};
use crate::embedding::Embedder;
use crate::error::{PensumError, Result};
use async_trait::async_trait;
use std::sync::{Arc, RwLock};

struct CourseEntry {
    course: Course,
    title_embedding: Vec<f32>,
}

struct ChunkEntry {
    chunk: CourseChunk,
    embedding: Vec<f32>,
}

/// In-memory course store.
pub struct MemoryCourseStore {
    embedder: Arc<dyn Embedder>,
    courses: RwLock<Vec<CourseEntry>>,
    chunks: RwLock<Vec<ChunkEntry>>,
    max_results: usize,
}

impl MemoryCourseStore {
    /// Create a new in-memory course store.
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            courses: RwLock::new(Vec::new()),
            chunks: RwLock::new(Vec::new()),
            max_results: DEFAULT_MAX_RESULTS,
        }
    }

    /// Override the default search result limit.
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    fn catalog(&self) -> Vec<(String, Vec<f32>)> {
        let courses = self.courses.read().unwrap();
        courses
            .iter()
            .map(|entry| (entry.course.title.clone(), entry.title_embedding.clone()))
            .collect()
    }
}

#[async_trait]
impl CourseStore for MemoryCourseStore {
    async fn add_course(&self, course: &Course) -> Result<()> {
        let title_embedding = self.embedder.embed(&course.title).await?;

        let mut courses = self.courses.write().unwrap();
        courses.retain(|entry| entry.course.title != course.title);
        courses.push(CourseEntry {
            course: course.clone(),
            title_embedding,
        });
        Ok(())
    }

    async fn add_chunks(&self, chunks: &[CourseChunk]) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let contents: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&contents).await?;

        let mut store = self.chunks.write().unwrap();
        for (chunk, embedding) in chunks.iter().zip(embeddings) {
            store.retain(|entry| {
                entry.chunk.course_title != chunk.course_title
                    || entry.chunk.chunk_index != chunk.chunk_index
            });
            store.push(ChunkEntry {
                chunk: chunk.clone(),
                embedding,
            });
        }
        Ok(chunks.len())
    }

    async fn search(
        &self,
        query: &str,
        course_name: Option<&str>,
        lesson_number: Option<u32>,
        limit: Option<usize>,
    ) -> Result<Vec<SearchHit>> {
        let course_filter = match course_name {
            Some(name) => Some(
                self.resolve_course_name(name)
                    .await?
                    .ok_or_else(|| PensumError::CourseNotFound(name.to_string()))?,
            ),
            None => None,
        };

        let query_embedding = self.embedder.embed(query).await?;
        let limit = limit.unwrap_or(self.max_results);

        let chunks = self.chunks.read().unwrap();
        let mut hits: Vec<SearchHit> = chunks
            .iter()
            .filter(|entry| {
                course_filter
                    .as_ref()
                    .map_or(true, |filter| &entry.chunk.course_title == filter)
                    && lesson_number.map_or(true, |wanted| entry.chunk.lesson_number == Some(wanted))
            })
            .map(|entry| SearchHit {
                content: entry.chunk.content.clone(),
                course_title: entry.chunk.course_title.clone(),
                lesson_number: entry.chunk.lesson_number,
                score: cosine_similarity(&query_embedding, &entry.embedding),
            })
            .collect();

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(limit);

        Ok(hits)
    }

    async fn resolve_course_name(&self, name: &str) -> Result<Option<String>> {
        let catalog = self.catalog();
        if catalog.is_empty() {
            return Ok(None);
        }

        let needle = name.to_lowercase();
        for (title, _) in &catalog {
            if title.to_lowercase() == needle {
                return Ok(Some(title.clone()));
            }
        }
        for (title, _) in &catalog {
            if title.to_lowercase().contains(&needle) {
                return Ok(Some(title.clone()));
            }
        }

        let name_embedding = self.embedder.embed(name).await?;
        let best = catalog
            .iter()
            .map(|(title, embedding)| (title, cosine_similarity(&name_embedding, embedding)))
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

        // Same acceptance floor as the SQLite store.
        Ok(best
            .filter(|(_, score)| *score >= 0.3)
            .map(|(title, _)| title.clone()))
    }

    async fn get_lesson_link(&self, course_title: &str, lesson_number: u32) -> Result<Option<String>> {
        let courses = self.courses.read().unwrap();
        Ok(courses
            .iter()
            .find(|entry| entry.course.title == course_title)
            .and_then(|entry| {
                entry
                    .course
                    .lessons
                    .iter()
                    .find(|lesson| lesson.number == lesson_number)
            })
            .and_then(|lesson| lesson.link.clone()))
    }

    async fn get_course_outline(&self, course_name: &str) -> Result<Option<Course>> {
        let Some(title) = self.resolve_course_name(course_name).await? else {
            return Ok(None);
        };

        let courses = self.courses.read().unwrap();
        Ok(courses
            .iter()
            .find(|entry| entry.course.title == title)
            .map(|entry| entry.course.clone()))
    }

    async fn course_count(&self) -> Result<usize> {
        Ok(self.courses.read().unwrap().len())
    }

    async fn course_titles(&self) -> Result<Vec<String>> {
        let courses = self.courses.read().unwrap();
        let mut titles: Vec<String> = courses
            .iter()
            .map(|entry| entry.course.title.clone())
            .collect();
        titles.sort();
        Ok(titles)
    }

    async fn clear_all(&self) -> Result<()> {
        self.courses.write().unwrap().clear();
        self.chunks.write().unwrap().clear();
        Ok(())
    }
}

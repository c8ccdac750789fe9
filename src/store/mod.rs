//! Course knowledge store abstraction.
//!
//! Two backends implement [`CourseStore`]: a SQLite store for persistent
//! indexes and an in-memory store for tests and demo use. The interface is
//! text-based; each store owns an embedder and handles vectorization
//! internally, so callers never see raw vectors.

mod memory;
mod sqlite;

pub use memory::MemoryCourseStore;
pub use sqlite::SqliteCourseStore;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Default number of search hits when the caller does not specify a limit.
pub const DEFAULT_MAX_RESULTS: usize = 5;

/// One lesson within a course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    pub number: u32,
    pub title: String,
    pub link: Option<String>,
}

/// Course metadata with its ordered lesson list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub title: String,
    pub link: Option<String>,
    pub instructor: Option<String>,
    pub lessons: Vec<Lesson>,
}

impl Course {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: None,
            instructor: None,
            lessons: Vec::new(),
        }
    }
}

/// One indexed piece of course content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseChunk {
    /// Chunk text, possibly prefixed with course/lesson context.
    pub content: String,
    /// Exact title of the course this chunk belongs to.
    pub course_title: String,
    /// Lesson the chunk came from, if the document attributed one.
    pub lesson_number: Option<u32>,
    /// Position of this chunk within the course, sequential across lessons.
    pub chunk_index: u32,
}

/// A search match with its similarity score (higher is better).
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub content: String,
    pub course_title: String,
    pub lesson_number: Option<u32>,
    pub score: f32,
}

/// Trait for course store implementations.
///
/// `search` resolves any course-name filter before querying; an
/// unresolvable filter is an error (`CourseNotFound`) rather than an empty
/// result, so callers can tell "bad filter" from "no matches".
#[async_trait]
pub trait CourseStore: Send + Sync {
    /// Upsert course metadata, keyed by exact title. Replaces any
    /// previously stored lesson list for that course.
    async fn add_course(&self, course: &Course) -> Result<()>;

    /// Embed and store content chunks.
    async fn add_chunks(&self, chunks: &[CourseChunk]) -> Result<usize>;

    /// Semantic search over chunk content with optional filters.
    async fn search(
        &self,
        query: &str,
        course_name: Option<&str>,
        lesson_number: Option<u32>,
        limit: Option<usize>,
    ) -> Result<Vec<SearchHit>>;

    /// Resolve a partial or approximate course name to an exact indexed
    /// title.
    async fn resolve_course_name(&self, name: &str) -> Result<Option<String>>;

    /// Link for one lesson of a course, if recorded.
    async fn get_lesson_link(&self, course_title: &str, lesson_number: u32) -> Result<Option<String>>;

    /// Full course metadata (title, link, lessons) for an approximate name.
    async fn get_course_outline(&self, course_name: &str) -> Result<Option<Course>>;

    /// Number of indexed courses.
    async fn course_count(&self) -> Result<usize>;

    /// Titles of all indexed courses, alphabetical.
    async fn course_titles(&self) -> Result<Vec<String>>;

    /// Drop all indexed data.
    async fn clear_all(&self) -> Result<()>;
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![0.0, 1.0, 0.0];
        assert!((cosine_similarity(&a, &c)).abs() < 0.001);

        let d = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &d) + 1.0).abs() < 0.001);
    }

    #[test]
    fn test_cosine_similarity_mismatched_lengths() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn test_course_new_defaults() {
        let course = Course::new("Intro to AI");
        assert_eq!(course.title, "Intro to AI");
        assert!(course.link.is_none());
        assert!(course.lessons.is_empty());
    }
}

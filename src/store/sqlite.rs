//! SQLite-based course store implementation.
//!
//! Chunk embeddings live in a BLOB column and cosine similarity is
//! computed in Rust. Course catalogs are small; a dedicated vector
//! database would be overkill here.

use super::{cosine_similarity, Course, CourseChunk, CourseStore, Lesson, SearchHit, DEFAULT_MAX_RESULTS};
use crate::embedding::Embedder;
use crate::error::{PensumError, Result};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, instrument};

/// Floor for accepting a semantic course-title match during name
/// resolution. Below this, the filter is treated as unresolvable.
const MIN_TITLE_SIMILARITY: f32 = 0.3;

/// SQLite-backed course store. Owns its embedder so the public interface
/// stays text-based.
pub struct SqliteCourseStore {
    conn: Mutex<Connection>,
    embedder: Arc<dyn Embedder>,
    max_results: usize,
}

impl SqliteCourseStore {
    /// Open (or create) a course store at the given path.
    #[instrument(skip_all)]
    pub fn new(path: &Path, embedder: Arc<dyn Embedder>) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        init_schema(&conn)?;

        info!("Initialized SQLite course store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
            embedder,
            max_results: DEFAULT_MAX_RESULTS,
        })
    }

    /// Create an in-memory course store (useful for testing).
    pub fn in_memory(embedder: Arc<dyn Embedder>) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
            embedder,
            max_results: DEFAULT_MAX_RESULTS,
        })
    }

    /// Override the default search result limit.
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| PensumError::Store(format!("Failed to acquire lock: {}", e)))
    }

    /// All course titles with their title embeddings, for name resolution.
    fn load_catalog(&self) -> Result<Vec<(String, Vec<f32>)>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare("SELECT title, title_embedding FROM courses")?;

        let rows = stmt.query_map([], |row| {
            let title: String = row.get(0)?;
            let embedding_bytes: Vec<u8> = row.get(1)?;
            Ok((title, bytes_to_embedding(&embedding_bytes)))
        })?;

        Ok(rows.filter_map(|r| r.ok()).collect())
    }
}

#[async_trait]
impl CourseStore for SqliteCourseStore {
    #[instrument(skip(self, course), fields(title = %course.title))]
    async fn add_course(&self, course: &Course) -> Result<()> {
        let title_embedding = self.embedder.embed(&course.title).await?;
        let embedding_bytes = embedding_to_bytes(&title_embedding);

        let conn = self.lock_conn()?;
        let tx = conn.unchecked_transaction()?;

        tx.execute(
            r#"
            INSERT OR REPLACE INTO courses (title, link, instructor, title_embedding, indexed_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                course.title,
                course.link,
                course.instructor,
                embedding_bytes,
                Utc::now().to_rfc3339(),
            ],
        )?;

        tx.execute(
            "DELETE FROM lessons WHERE course_title = ?1",
            params![course.title],
        )?;

        for lesson in &course.lessons {
            tx.execute(
                r#"
                INSERT INTO lessons (course_title, lesson_number, title, link)
                VALUES (?1, ?2, ?3, ?4)
                "#,
                params![course.title, lesson.number, lesson.title, lesson.link],
            )?;
        }

        tx.commit()?;
        debug!("Upserted course '{}' with {} lessons", course.title, course.lessons.len());
        Ok(())
    }

    #[instrument(skip(self, chunks), fields(count = chunks.len()))]
    async fn add_chunks(&self, chunks: &[CourseChunk]) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let contents: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&contents).await?;

        let conn = self.lock_conn()?;
        let tx = conn.unchecked_transaction()?;

        for (chunk, embedding) in chunks.iter().zip(embeddings.iter()) {
            tx.execute(
                r#"
                INSERT OR REPLACE INTO chunks
                (course_title, chunk_index, lesson_number, content, embedding)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![
                    chunk.course_title,
                    chunk.chunk_index,
                    chunk.lesson_number,
                    chunk.content,
                    embedding_to_bytes(embedding),
                ],
            )?;
        }

        tx.commit()?;
        info!("Indexed {} chunks", chunks.len());
        Ok(chunks.len())
    }

    #[instrument(skip(self))]
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

        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(
            "SELECT content, course_title, lesson_number, embedding FROM chunks",
        )?;

        let rows = stmt.query_map([], |row| {
            let content: String = row.get(0)?;
            let course_title: String = row.get(1)?;
            let lesson: Option<u32> = row.get(2)?;
            let embedding_bytes: Vec<u8> = row.get(3)?;
            Ok((content, course_title, lesson, bytes_to_embedding(&embedding_bytes)))
        })?;

        let mut hits: Vec<SearchHit> = rows
            .filter_map(|r| r.ok())
            .filter(|(_, course_title, lesson, _)| {
                course_filter
                    .as_ref()
                    .map_or(true, |filter| course_title == filter)
                    && lesson_number.map_or(true, |wanted| *lesson == Some(wanted))
            })
            .map(|(content, course_title, lesson, embedding)| SearchHit {
                score: cosine_similarity(&query_embedding, &embedding),
                content,
                course_title,
                lesson_number: lesson,
            })
            .collect();

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(limit);

        debug!("Found {} matching chunks", hits.len());
        Ok(hits)
    }

    async fn resolve_course_name(&self, name: &str) -> Result<Option<String>> {
        let catalog = self.load_catalog()?;
        if catalog.is_empty() {
            return Ok(None);
        }

        if let Some(title) = match_title_directly(name, catalog.iter().map(|(t, _)| t.as_str())) {
            return Ok(Some(title));
        }

        let name_embedding = self.embedder.embed(name).await?;
        let best = catalog
            .iter()
            .map(|(title, embedding)| (title, cosine_similarity(&name_embedding, embedding)))
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

        Ok(best
            .filter(|(_, score)| *score >= MIN_TITLE_SIMILARITY)
            .map(|(title, _)| title.clone()))
    }

    async fn get_lesson_link(&self, course_title: &str, lesson_number: u32) -> Result<Option<String>> {
        let conn = self.lock_conn()?;

        let link = conn.query_row(
            "SELECT link FROM lessons WHERE course_title = ?1 AND lesson_number = ?2",
            params![course_title, lesson_number],
            |row| row.get::<_, Option<String>>(0),
        );

        match link {
            Ok(link) => Ok(link),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self))]
    async fn get_course_outline(&self, course_name: &str) -> Result<Option<Course>> {
        let Some(title) = self.resolve_course_name(course_name).await? else {
            return Ok(None);
        };

        let conn = self.lock_conn()?;

        let (link, instructor) = conn.query_row(
            "SELECT link, instructor FROM courses WHERE title = ?1",
            params![title],
            |row| Ok((row.get::<_, Option<String>>(0)?, row.get::<_, Option<String>>(1)?)),
        )?;

        let mut stmt = conn.prepare(
            r#"
            SELECT lesson_number, title, link FROM lessons
            WHERE course_title = ?1
            ORDER BY lesson_number
            "#,
        )?;

        let lessons = stmt.query_map(params![title], |row| {
            Ok(Lesson {
                number: row.get(0)?,
                title: row.get(1)?,
                link: row.get(2)?,
            })
        })?;

        Ok(Some(Course {
            title,
            link,
            instructor,
            lessons: lessons.filter_map(|l| l.ok()).collect(),
        }))
    }

    async fn course_count(&self) -> Result<usize> {
        let conn = self.lock_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM courses", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    async fn course_titles(&self) -> Result<Vec<String>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare("SELECT title FROM courses ORDER BY title")?;
        let titles = stmt.query_map([], |row| row.get(0))?;
        Ok(titles.filter_map(|t| t.ok()).collect())
    }

    async fn clear_all(&self) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute_batch(
            "DELETE FROM chunks; DELETE FROM lessons; DELETE FROM courses;",
        )?;
        info!("Cleared all indexed courses");
        Ok(())
    }
}

fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS courses (
            title TEXT PRIMARY KEY,
            link TEXT,
            instructor TEXT,
            title_embedding BLOB NOT NULL,
            indexed_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS lessons (
            course_title TEXT NOT NULL,
            lesson_number INTEGER NOT NULL,
            title TEXT NOT NULL,
            link TEXT,
            PRIMARY KEY (course_title, lesson_number)
        );

        CREATE TABLE IF NOT EXISTS chunks (
            course_title TEXT NOT NULL,
            chunk_index INTEGER NOT NULL,
            lesson_number INTEGER,
            content TEXT NOT NULL,
            embedding BLOB NOT NULL,
            PRIMARY KEY (course_title, chunk_index)
        );

        CREATE INDEX IF NOT EXISTS idx_lessons_course ON lessons(course_title);
        CREATE INDEX IF NOT EXISTS idx_chunks_course ON chunks(course_title);
        "#,
    )?;
    Ok(())
}

/// Case-insensitive exact match first, then substring containment.
fn match_title_directly<'a>(name: &str, titles: impl Iterator<Item = &'a str>) -> Option<String> {
    let needle = name.to_lowercase();
    let mut substring_match = None;

    for title in titles {
        let lower = title.to_lowercase();
        if lower == needle {
            return Some(title.to_string());
        }
        if substring_match.is_none() && lower.contains(&needle) {
            substring_match = Some(title.to_string());
        }
    }

    substring_match
}

/// Serialize embedding to bytes.
fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Deserialize embedding from bytes.
fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| {
            let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
            f32::from_le_bytes(arr)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashedNgramEmbedder;

    fn store() -> SqliteCourseStore {
        SqliteCourseStore::in_memory(Arc::new(HashedNgramEmbedder::new())).unwrap()
    }

    fn sample_course() -> Course {
        Course {
            title: "Intro to AI".to_string(),
            link: Some("https://example.com/course".to_string()),
            instructor: Some("Ada".to_string()),
            lessons: vec![
                Lesson {
                    number: 1,
                    title: "What is AI".to_string(),
                    link: Some("https://example.com/lesson1".to_string()),
                },
                Lesson {
                    number: 2,
                    title: "Embeddings".to_string(),
                    link: None,
                },
            ],
        }
    }

    fn sample_chunks() -> Vec<CourseChunk> {
        vec![
            CourseChunk {
                content: "Neural networks learn weighted connections".to_string(),
                course_title: "Intro to AI".to_string(),
                lesson_number: Some(1),
                chunk_index: 0,
            },
            CourseChunk {
                content: "Embeddings map text into dense vectors".to_string(),
                course_title: "Intro to AI".to_string(),
                lesson_number: Some(2),
                chunk_index: 1,
            },
        ]
    }

    #[tokio::test]
    async fn test_add_and_search_chunks() {
        let store = store();
        store.add_course(&sample_course()).await.unwrap();
        store.add_chunks(&sample_chunks()).await.unwrap();

        let hits = store
            .search("embeddings vectors", None, None, None)
            .await
            .unwrap();
        assert!(!hits.is_empty());
        assert_eq!(hits[0].course_title, "Intro to AI");
        assert_eq!(hits[0].lesson_number, Some(2));
    }

    #[tokio::test]
    async fn test_search_with_lesson_filter() {
        let store = store();
        store.add_course(&sample_course()).await.unwrap();
        store.add_chunks(&sample_chunks()).await.unwrap();

        let hits = store
            .search("networks", None, Some(1), None)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].lesson_number, Some(1));
    }

    #[tokio::test]
    async fn test_search_with_partial_course_name() {
        let store = store();
        store.add_course(&sample_course()).await.unwrap();
        store.add_chunks(&sample_chunks()).await.unwrap();

        let hits = store
            .search("vectors", Some("intro"), None, None)
            .await
            .unwrap();
        assert!(!hits.is_empty());
    }

    #[tokio::test]
    async fn test_search_unresolvable_course_is_error() {
        let store = store();
        store.add_course(&sample_course()).await.unwrap();

        let err = store
            .search("anything", Some("Quantum Basket Weaving"), None, None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("No course found matching"));
    }

    #[tokio::test]
    async fn test_resolve_course_name_empty_store() {
        let store = store();
        let resolved = store.resolve_course_name("Intro").await.unwrap();
        assert!(resolved.is_none());
    }

    #[tokio::test]
    async fn test_get_lesson_link() {
        let store = store();
        store.add_course(&sample_course()).await.unwrap();

        let link = store.get_lesson_link("Intro to AI", 1).await.unwrap();
        assert_eq!(link.as_deref(), Some("https://example.com/lesson1"));

        assert!(store.get_lesson_link("Intro to AI", 2).await.unwrap().is_none());
        assert!(store.get_lesson_link("Intro to AI", 99).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_course_outline() {
        let store = store();
        store.add_course(&sample_course()).await.unwrap();

        let outline = store.get_course_outline("intro to ai").await.unwrap().unwrap();
        assert_eq!(outline.title, "Intro to AI");
        assert_eq!(outline.lessons.len(), 2);
        assert_eq!(outline.lessons[0].number, 1);

        assert!(store.get_course_outline("Nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_add_course_replaces_lessons() {
        let store = store();
        store.add_course(&sample_course()).await.unwrap();

        let mut updated = sample_course();
        updated.lessons.truncate(1);
        store.add_course(&updated).await.unwrap();

        let outline = store.get_course_outline("Intro to AI").await.unwrap().unwrap();
        assert_eq!(outline.lessons.len(), 1);
        assert_eq!(store.course_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_clear_all() {
        let store = store();
        store.add_course(&sample_course()).await.unwrap();
        store.add_chunks(&sample_chunks()).await.unwrap();

        store.clear_all().await.unwrap();
        assert_eq!(store.course_count().await.unwrap(), 0);
        assert!(store.search("anything", None, None, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_persistent_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("courses.db");

        {
            let store =
                SqliteCourseStore::new(&path, Arc::new(HashedNgramEmbedder::new())).unwrap();
            store.add_course(&sample_course()).await.unwrap();
            store.add_chunks(&sample_chunks()).await.unwrap();
        }

        let reopened =
            SqliteCourseStore::new(&path, Arc::new(HashedNgramEmbedder::new())).unwrap();
        assert_eq!(reopened.course_count().await.unwrap(), 1);
        assert_eq!(
            reopened.course_titles().await.unwrap(),
            vec!["Intro to AI".to_string()]
        );
    }
}

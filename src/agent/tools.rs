//! Retrieval tools exposed to the model.
//!
//! Every tool resolves to a formatted string, whatever happens: matches,
//! no matches, or a store failure. The generator can therefore forward any
//! outcome as a tool result without special cases. Provenance goes into
//! the caller-supplied source sink, one record per retrieved item.

use crate::llm::ToolDefinition;
use crate::store::CourseStore;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

/// Provenance entry for one retrieved item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRecord {
    /// Display text, e.g. "Intro to AI - Lesson 2".
    pub text: String,
    /// Resolvable link, when the store has one.
    pub link: Option<String>,
}

/// A named retrieval capability with a declared input schema.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The tool's call schema. Pure; no side effects.
    fn definition(&self) -> ToolDefinition;

    /// Run the tool. Always returns presentable text; failures are
    /// described, not raised. Sources for this call go into `sources`.
    async fn execute(&self, args: &Value, sources: &mut Vec<SourceRecord>) -> String;
}

/// Semantic search within course content, with optional course and lesson
/// filters.
pub struct CourseSearchTool {
    store: Arc<dyn CourseStore>,
}

impl CourseSearchTool {
    pub fn new(store: Arc<dyn CourseStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for CourseSearchTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "search_course_content".to_string(),
            description: "Search course materials with smart course name matching and lesson filtering".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "What to search for in the course content"
                    },
                    "course_name": {
                        "type": "string",
                        "description": "Course title (partial matches work, e.g. 'MCP', 'Introduction')"
                    },
                    "lesson_number": {
                        "type": "integer",
                        "description": "Specific lesson number to search within (e.g. 1, 2, 3)"
                    }
                },
                "required": ["query"]
            }),
        }
    }

    async fn execute(&self, args: &Value, sources: &mut Vec<SourceRecord>) -> String {
        let Some(query) = args.get("query").and_then(Value::as_str) else {
            return "Missing required parameter 'query'".to_string();
        };
        let course_name = args.get("course_name").and_then(Value::as_str);
        let lesson_number = args
            .get("lesson_number")
            .and_then(Value::as_u64)
            .map(|n| n as u32);

        debug!(query, ?course_name, ?lesson_number, "searching course content");

        let hits = match self.store.search(query, course_name, lesson_number, None).await {
            Ok(hits) => hits,
            Err(e) => return e.to_string(),
        };

        if hits.is_empty() {
            let mut message = String::from("No relevant content found");
            if let Some(name) = course_name {
                message.push_str(&format!(" in course '{}'", name));
            }
            if let Some(number) = lesson_number {
                message.push_str(&format!(" in lesson {}", number));
            }
            message.push('.');
            return message;
        }

        let mut formatted = Vec::with_capacity(hits.len());
        for hit in &hits {
            let label = match hit.lesson_number {
                Some(number) => format!("{} - Lesson {}", hit.course_title, number),
                None => hit.course_title.clone(),
            };
            let link = match hit.lesson_number {
                Some(number) => self
                    .store
                    .get_lesson_link(&hit.course_title, number)
                    .await
                    .unwrap_or(None),
                None => None,
            };
            sources.push(SourceRecord {
                text: label.clone(),
                link,
            });
            formatted.push(format!("[{}]\n{}", label, hit.content));
        }

        formatted.join("\n\n")
    }
}

/// Course outline lookup: title, link, and the full lesson list.
pub struct CourseOutlineTool {
    store: Arc<dyn CourseStore>,
}

impl CourseOutlineTool {
    pub fn new(store: Arc<dyn CourseStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for CourseOutlineTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "get_course_outline".to_string(),
            description: "Retrieve a course's title, link, and complete lesson list. Use for questions about course structure, overviews, or what a course covers".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "course_name": {
                        "type": "string",
                        "description": "Course title to look up (partial matches work)"
                    }
                },
                "required": ["course_name"]
            }),
        }
    }

    async fn execute(&self, args: &Value, sources: &mut Vec<SourceRecord>) -> String {
        let Some(course_name) = args.get("course_name").and_then(Value::as_str) else {
            return "Missing required parameter 'course_name'".to_string();
        };

        debug!(course_name, "looking up course outline");

        let course = match self.store.get_course_outline(course_name).await {
            Ok(Some(course)) => course,
            Ok(None) => return format!("No course found matching '{}'", course_name),
            Err(e) => return e.to_string(),
        };

        sources.push(SourceRecord {
            text: course.title.clone(),
            link: course.link.clone(),
        });

        let mut lines = vec![format!("Course: {}", course.title)];
        if let Some(link) = &course.link {
            lines.push(format!("Course Link: {}", link));
        }
        if let Some(instructor) = &course.instructor {
            lines.push(format!("Instructor: {}", instructor));
        }
        lines.push(format!("Lessons ({}):", course.lessons.len()));
        for lesson in &course.lessons {
            lines.push(format!("  {}. {}", lesson.number, lesson.title));
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PensumError, Result};
    use crate::store::{Course, CourseChunk, Lesson, SearchHit};
    use std::sync::Mutex;

    /// Scripted store double recording the filters it was called with.
    #[derive(Default)]
    struct StubStore {
        hits: Vec<SearchHit>,
        search_error: Option<String>,
        lesson_link: Option<String>,
        outline: Option<Course>,
        last_search: Mutex<Option<(String, Option<String>, Option<u32>)>>,
    }

    #[async_trait]
    impl CourseStore for StubStore {
        async fn add_course(&self, _course: &Course) -> Result<()> {
            Ok(())
        }

        async fn add_chunks(&self, _chunks: &[CourseChunk]) -> Result<usize> {
            Ok(0)
        }

        async fn search(
            &self,
            query: &str,
            course_name: Option<&str>,
            lesson_number: Option<u32>,
            _limit: Option<usize>,
        ) -> Result<Vec<SearchHit>> {
            *self.last_search.lock().unwrap() = Some((
                query.to_string(),
                course_name.map(str::to_string),
                lesson_number,
            ));
            match &self.search_error {
                Some(message) => Err(PensumError::Store(message.clone())),
                None => Ok(self.hits.clone()),
            }
        }

        async fn resolve_course_name(&self, _name: &str) -> Result<Option<String>> {
            Ok(self.outline.as_ref().map(|c| c.title.clone()))
        }

        async fn get_lesson_link(&self, _course: &str, _lesson: u32) -> Result<Option<String>> {
            Ok(self.lesson_link.clone())
        }

        async fn get_course_outline(&self, _name: &str) -> Result<Option<Course>> {
            Ok(self.outline.clone())
        }

        async fn course_count(&self) -> Result<usize> {
            Ok(0)
        }

        async fn course_titles(&self) -> Result<Vec<String>> {
            Ok(Vec::new())
        }

        async fn clear_all(&self) -> Result<()> {
            Ok(())
        }
    }

    fn two_lesson_hits() -> Vec<SearchHit> {
        vec![
            SearchHit {
                content: "Chunk A text".to_string(),
                course_title: "Intro to AI".to_string(),
                lesson_number: Some(1),
                score: 0.9,
            },
            SearchHit {
                content: "Chunk B text".to_string(),
                course_title: "Intro to AI".to_string(),
                lesson_number: Some(2),
                score: 0.8,
            },
        ]
    }

    #[tokio::test]
    async fn test_search_formats_headers_and_sources() {
        let store = Arc::new(StubStore {
            hits: two_lesson_hits(),
            lesson_link: Some("https://example.com/lesson".to_string()),
            ..Default::default()
        });
        let tool = CourseSearchTool::new(store);

        let mut sources = Vec::new();
        let output = tool
            .execute(&json!({"query": "what is covered"}), &mut sources)
            .await;

        assert!(output.contains("[Intro to AI - Lesson 1]"));
        assert!(output.contains("[Intro to AI - Lesson 2]"));
        assert!(output.contains("Chunk A text"));
        assert!(output.contains("Chunk B text"));

        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].text, "Intro to AI - Lesson 1");
        assert_eq!(sources[0].link.as_deref(), Some("https://example.com/lesson"));
        assert_eq!(sources[1].text, "Intro to AI - Lesson 2");
    }

    #[tokio::test]
    async fn test_search_forwards_filters_to_store() {
        let store = Arc::new(StubStore {
            hits: two_lesson_hits(),
            ..Default::default()
        });
        let tool = CourseSearchTool::new(Arc::clone(&store) as Arc<dyn CourseStore>);

        let mut sources = Vec::new();
        tool.execute(
            &json!({"query": "topic", "course_name": "Intro", "lesson_number": 2}),
            &mut sources,
        )
        .await;

        let recorded = store.last_search.lock().unwrap().clone();
        assert_eq!(
            recorded,
            Some(("topic".to_string(), Some("Intro".to_string()), Some(2)))
        );
    }

    #[tokio::test]
    async fn test_search_no_results_echoes_filters() {
        let tool = CourseSearchTool::new(Arc::new(StubStore::default()));

        let mut sources = Vec::new();
        let output = tool
            .execute(
                &json!({"query": "q", "course_name": "MCP", "lesson_number": 3}),
                &mut sources,
            )
            .await;

        assert_eq!(output, "No relevant content found in course 'MCP' in lesson 3.");
        assert!(sources.is_empty());
    }

    #[tokio::test]
    async fn test_search_no_results_without_filters() {
        let tool = CourseSearchTool::new(Arc::new(StubStore::default()));

        let mut sources = Vec::new();
        let output = tool.execute(&json!({"query": "q"}), &mut sources).await;

        assert_eq!(output, "No relevant content found.");
    }

    #[tokio::test]
    async fn test_search_store_failure_described_not_raised() {
        let store = Arc::new(StubStore {
            search_error: Some("timeout".to_string()),
            ..Default::default()
        });
        let tool = CourseSearchTool::new(store);

        let mut sources = Vec::new();
        let output = tool.execute(&json!({"query": "q"}), &mut sources).await;

        assert!(output.contains("timeout"));
        assert!(sources.is_empty());
    }

    #[tokio::test]
    async fn test_search_missing_query_is_described() {
        let tool = CourseSearchTool::new(Arc::new(StubStore::default()));

        let mut sources = Vec::new();
        let output = tool.execute(&json!({}), &mut sources).await;

        assert!(output.contains("query"));
    }

    #[tokio::test]
    async fn test_search_hit_without_lesson_number() {
        let store = Arc::new(StubStore {
            hits: vec![SearchHit {
                content: "Overview text".to_string(),
                course_title: "Intro to AI".to_string(),
                lesson_number: None,
                score: 0.5,
            }],
            lesson_link: Some("https://example.com/ignored".to_string()),
            ..Default::default()
        });
        let tool = CourseSearchTool::new(store);

        let mut sources = Vec::new();
        let output = tool.execute(&json!({"query": "overview"}), &mut sources).await;

        assert!(output.contains("[Intro to AI]\nOverview text"));
        assert_eq!(sources[0].text, "Intro to AI");
        assert!(sources[0].link.is_none());
    }

    #[tokio::test]
    async fn test_outline_formats_lesson_list() {
        let store = Arc::new(StubStore {
            outline: Some(Course {
                title: "Intro to AI".to_string(),
                link: Some("https://example.com/course".to_string()),
                instructor: None,
                lessons: vec![
                    Lesson {
                        number: 1,
                        title: "What is AI".to_string(),
                        link: None,
                    },
                    Lesson {
                        number: 2,
                        title: "Embeddings".to_string(),
                        link: None,
                    },
                ],
            }),
            ..Default::default()
        });
        let tool = CourseOutlineTool::new(store);

        let mut sources = Vec::new();
        let output = tool
            .execute(&json!({"course_name": "intro"}), &mut sources)
            .await;

        assert!(output.contains("Course: Intro to AI"));
        assert!(output.contains("Course Link: https://example.com/course"));
        assert!(output.contains("Lessons (2):"));
        assert!(output.contains("1. What is AI"));
        assert!(output.contains("2. Embeddings"));

        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].text, "Intro to AI");
        assert_eq!(sources[0].link.as_deref(), Some("https://example.com/course"));
    }

    #[tokio::test]
    async fn test_outline_unknown_course() {
        let tool = CourseOutlineTool::new(Arc::new(StubStore::default()));

        let mut sources = Vec::new();
        let output = tool
            .execute(&json!({"course_name": "Nonexistent"}), &mut sources)
            .await;

        assert_eq!(output, "No course found matching 'Nonexistent'");
        assert!(sources.is_empty());
    }

    #[test]
    fn test_definitions_declare_schemas() {
        let search = CourseSearchTool::new(Arc::new(StubStore::default())).definition();
        assert_eq!(search.name, "search_course_content");
        assert_eq!(search.input_schema["required"][0], "query");

        let outline = CourseOutlineTool::new(Arc::new(StubStore::default())).definition();
        assert_eq!(outline.name, "get_course_outline");
        assert_eq!(outline.input_schema["required"][0], "course_name");
    }
}

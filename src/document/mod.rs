//! Course document ingestion.
//!
//! Turns a course text file into a [`Course`] record plus the
//! embedded-ready [`CourseChunk`]s the store indexes.

mod chunker;
mod parser;

pub use chunker::{chunk_text, split_sentences, ChunkingConfig};
pub use parser::{DocumentParser, ParsedDocument, Segment};

use crate::error::Result;
use crate::store::{Course, CourseChunk};
use std::path::Path;
use tracing::debug;

/// Read and process one course document from disk.
pub fn process_document(path: &Path, config: &ChunkingConfig) -> Result<(Course, Vec<CourseChunk>)> {
    let raw = std::fs::read_to_string(path)?;
    let result = process_text(&raw, config)?;
    debug!(
        path = %path.display(),
        course = %result.0.title,
        chunks = result.1.len(),
        "processed course document"
    );
    Ok(result)
}

/// Process raw course text into its course record and chunks.
///
/// Chunk indices run sequentially across the whole course. The first
/// chunk of every segment is prefixed with the course (and lesson)
/// name, so a chunk retrieved on its own stays attributable.
pub fn process_text(raw: &str, config: &ChunkingConfig) -> Result<(Course, Vec<CourseChunk>)> {
    let parsed = DocumentParser::new().parse(raw)?;

    let mut chunks = Vec::new();
    let mut chunk_index = 0u32;

    for segment in &parsed.segments {
        let pieces = chunk_text(&segment.text, config);
        for (position, piece) in pieces.into_iter().enumerate() {
            let content = if position == 0 {
                match segment.lesson_number {
                    Some(number) => format!(
                        "Course {} Lesson {} content: {}",
                        parsed.course.title, number, piece
                    ),
                    None => format!("Course {} content: {}", parsed.course.title, piece),
                }
            } else {
                piece
            };
            chunks.push(CourseChunk {
                content,
                course_title: parsed.course.title.clone(),
                lesson_number: segment.lesson_number,
                chunk_index,
            });
            chunk_index += 1;
        }
    }

    Ok((parsed.course, chunks))
}

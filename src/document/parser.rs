//! Course document parsing.
//!
//! Documents open with up to three header lines (`Course Title:`,
//! `Course Link:`, `Course Instructor:`), matched by prefix and
//! case-insensitively. The body is segmented on `Lesson <n>: <title>`
//! markers; a `Lesson Link:` line directly after a marker attaches to
//! that lesson. Text before the first marker belongs to no lesson.

use crate::error::{PensumError, Result};
use crate::store::{Course, Lesson};
use regex::Regex;

/// One contiguous run of course text, tied to a lesson when it appeared
/// under a lesson marker.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub lesson_number: Option<u32>,
    pub text: String,
}

/// A parsed course document: metadata plus ordered text segments.
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    pub course: Course,
    pub segments: Vec<Segment>,
}

pub struct DocumentParser {
    lesson_regex: Regex,
}

impl DocumentParser {
    pub fn new() -> Self {
        // Matches lesson markers like "Lesson 0: Introduction"
        let lesson_regex = Regex::new(r"(?i)^lesson\s+(\d+):\s*(.+)$").expect("Invalid regex");
        Self { lesson_regex }
    }

    /// Parse a full course document. A missing course title is an error;
    /// every other header is optional.
    pub fn parse(&self, raw: &str) -> Result<ParsedDocument> {
        let lines: Vec<&str> = raw.lines().collect();

        let mut course_title = None;
        let mut course_link = None;
        let mut instructor = None;
        let mut body_start = 0;

        // Headers occupy the leading lines; the first non-header line
        // starts the body.
        for (idx, line) in lines.iter().enumerate().take(3) {
            if let Some(value) = header_value(line, "course title:") {
                course_title = non_empty(value);
            } else if let Some(value) = header_value(line, "course link:") {
                course_link = non_empty(value);
            } else if let Some(value) = header_value(line, "course instructor:") {
                instructor = non_empty(value);
            } else {
                break;
            }
            body_start = idx + 1;
        }

        let Some(title) = course_title else {
            return Err(PensumError::Document(
                "document has no 'Course Title:' header".to_string(),
            ));
        };

        let mut lessons: Vec<Lesson> = Vec::new();
        let mut segments: Vec<Segment> = Vec::new();
        let mut preamble: Vec<&str> = Vec::new();
        let mut current: Option<(Lesson, Vec<&str>)> = None;
        // True only between a lesson marker and the first body line,
        // where a "Lesson Link:" header may still appear.
        let mut link_slot_open = false;

        for line in &lines[body_start..] {
            if let Some(caps) = self.lesson_regex.captures(line.trim()) {
                if let Ok(number) = caps[1].parse::<u32>() {
                    if let Some((lesson, body)) = current.take() {
                        push_segment(&mut segments, Some(lesson.number), &body);
                        lessons.push(lesson);
                    } else {
                        push_segment(&mut segments, None, &preamble);
                    }
                    current = Some((
                        Lesson {
                            number,
                            title: caps[2].trim().to_string(),
                            link: None,
                        },
                        Vec::new(),
                    ));
                    link_slot_open = true;
                    continue;
                }
            }

            if link_slot_open {
                if let Some(value) = header_value(line, "lesson link:") {
                    if let Some((lesson, _)) = &mut current {
                        lesson.link = non_empty(value);
                    }
                    link_slot_open = false;
                    continue;
                }
                if !line.trim().is_empty() {
                    link_slot_open = false;
                }
            }

            match &mut current {
                Some((_, body)) => body.push(line),
                None => preamble.push(line),
            }
        }

        if let Some((lesson, body)) = current.take() {
            push_segment(&mut segments, Some(lesson.number), &body);
            lessons.push(lesson);
        } else {
            push_segment(&mut segments, None, &preamble);
        }

        Ok(ParsedDocument {
            course: Course {
                title,
                link: course_link,
                instructor,
                lessons,
            },
            segments,
        })
    }
}

impl Default for DocumentParser {
    fn default() -> Self {
        Self::new()
    }
}

fn push_segment(segments: &mut Vec<Segment>, lesson_number: Option<u32>, body: &[&str]) {
    let text = body.join("\n").trim().to_string();
    if !text.is_empty() {
        segments.push(Segment {
            lesson_number,
            text,
        });
    }
}

fn header_value<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    let line = line.trim();
    let head = line.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(line[prefix.len()..].trim())
    } else {
        None
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_DOC: &str = "\
Course Title: Intro to AI
Course Link: https://example.com/course
Course Instructor: Ada Lovelace

Lesson 0: Welcome
Lesson Link: https://example.com/lesson0
Welcome to the course. We cover a lot of ground.

Lesson 1: What is AI
AI is the study of intelligent agents. This lesson defines the field.
";

    #[test]
    fn test_parses_headers_and_lessons() {
        let parsed = DocumentParser::new().parse(SAMPLE_DOC).unwrap();

        assert_eq!(parsed.course.title, "Intro to AI");
        assert_eq!(
            parsed.course.link.as_deref(),
            Some("https://example.com/course")
        );
        assert_eq!(parsed.course.instructor.as_deref(), Some("Ada Lovelace"));

        assert_eq!(parsed.course.lessons.len(), 2);
        assert_eq!(parsed.course.lessons[0].number, 0);
        assert_eq!(parsed.course.lessons[0].title, "Welcome");
        assert_eq!(
            parsed.course.lessons[0].link.as_deref(),
            Some("https://example.com/lesson0")
        );
        assert_eq!(parsed.course.lessons[1].number, 1);
        assert!(parsed.course.lessons[1].link.is_none());
    }

    #[test]
    fn test_segments_carry_lesson_numbers() {
        let parsed = DocumentParser::new().parse(SAMPLE_DOC).unwrap();

        assert_eq!(parsed.segments.len(), 2);
        assert_eq!(parsed.segments[0].lesson_number, Some(0));
        assert!(parsed.segments[0].text.starts_with("Welcome to the course."));
        assert_eq!(parsed.segments[1].lesson_number, Some(1));
        assert!(parsed.segments[1].text.contains("intelligent agents"));
    }

    #[test]
    fn test_lesson_link_line_not_treated_as_body() {
        let parsed = DocumentParser::new().parse(SAMPLE_DOC).unwrap();
        assert!(!parsed.segments[0].text.contains("Lesson Link:"));
    }

    #[test]
    fn test_text_before_first_marker_has_no_lesson() {
        let doc = "\
Course Title: Minimal Course

Some introductory preamble text.

Lesson 1: Start
Lesson one body.
";
        let parsed = DocumentParser::new().parse(doc).unwrap();

        assert_eq!(parsed.segments.len(), 2);
        assert_eq!(parsed.segments[0].lesson_number, None);
        assert_eq!(parsed.segments[0].text, "Some introductory preamble text.");
        assert_eq!(parsed.segments[1].lesson_number, Some(1));
    }

    #[test]
    fn test_headers_match_case_insensitively() {
        let doc = "\
course title: Lowercase Headers
COURSE LINK: https://example.com

Body text without lessons.
";
        let parsed = DocumentParser::new().parse(doc).unwrap();

        assert_eq!(parsed.course.title, "Lowercase Headers");
        assert_eq!(parsed.course.link.as_deref(), Some("https://example.com"));
        assert!(parsed.course.instructor.is_none());
        assert_eq!(parsed.segments.len(), 1);
        assert_eq!(parsed.segments[0].lesson_number, None);
    }

    #[test]
    fn test_missing_title_is_an_error() {
        let err = DocumentParser::new()
            .parse("Just some text without headers.")
            .unwrap_err();
        assert!(err.to_string().contains("Course Title"));
    }

    #[test]
    fn test_lesson_without_body_still_appears_in_outline() {
        let doc = "\
Course Title: Sparse Course

Lesson 1: Placeholder

Lesson 2: Real Content
Actual lesson text here.
";
        let parsed = DocumentParser::new().parse(doc).unwrap();

        assert_eq!(parsed.course.lessons.len(), 2);
        assert_eq!(parsed.segments.len(), 1);
        assert_eq!(parsed.segments[0].lesson_number, Some(2));
    }
}

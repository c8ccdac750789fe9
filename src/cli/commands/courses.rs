//! Courses command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::RagSystem;
use crate::store::CourseStore;
use anyhow::Result;

/// Run the courses command.
pub async fn run_courses(settings: Settings) -> Result<()> {
    let store = RagSystem::open_store(&settings)?;

    match store.course_titles().await {
        Ok(titles) => {
            if titles.is_empty() {
                Output::info("No courses indexed yet. Use 'pensum ingest <path>' to add content.");
            } else {
                Output::header(&format!("Indexed Courses ({})", titles.len()));
                println!();

                let mut total_lessons = 0;
                for title in &titles {
                    match store.get_course_outline(title).await? {
                        Some(course) => {
                            total_lessons += course.lessons.len();
                            Output::course_info(
                                &course.title,
                                course.lessons.len(),
                                course.instructor.as_deref(),
                            );
                        }
                        None => Output::list_item(title),
                    }
                }

                println!();
                Output::kv("Total courses", &titles.len().to_string());
                Output::kv("Total lessons", &total_lessons.to_string());
            }
        }
        Err(e) => {
            Output::error(&format!("Failed to list courses: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}

//! Search command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::RagSystem;
use crate::store::CourseStore;
use anyhow::Result;

/// Run the search command.
pub async fn run_search(
    query: &str,
    course: Option<String>,
    lesson: Option<u32>,
    limit: usize,
    settings: Settings,
) -> Result<()> {
    // Pre-flight checks
    if let Err(e) = preflight::check(Operation::Search, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'pensum doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let store = RagSystem::open_store(&settings)?;

    let spinner = Output::spinner("Searching...");

    let results = store
        .search(query, course.as_deref(), lesson, Some(limit))
        .await;
    spinner.finish_and_clear();

    match results {
        Ok(hits) => {
            if hits.is_empty() {
                Output::warning("No results found matching your query.");
            } else {
                Output::success(&format!("Found {} results", hits.len()));

                for hit in &hits {
                    Output::search_result(
                        &hit.course_title,
                        hit.lesson_number,
                        hit.score,
                        &hit.content,
                    );
                }
            }
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}

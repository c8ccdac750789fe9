//! Ingest command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::RagSystem;
use crate::store::CourseStore;
use anyhow::Result;
use std::path::Path;

/// Run the ingest command.
pub async fn run_ingest(path: &str, clear: bool, settings: Settings) -> Result<()> {
    // Pre-flight checks
    if let Err(e) = preflight::check(Operation::Ingest, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'pensum doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    // Ingestion never calls the completion API, so skip that client.
    let store = RagSystem::open_store(&settings)?;
    let system = RagSystem::with_components(settings, store, None);

    let target = Path::new(path);
    if !target.exists() {
        Output::error(&format!("Path not found: {}", path));
        return Err(anyhow::anyhow!("path not found: {}", path));
    }

    if target.is_file() {
        if clear {
            system.store().clear_all().await?;
            Output::info("Cleared existing course data.");
        }

        let spinner = Output::spinner(&format!("Indexing {}...", path));
        match system.add_course_document(target).await {
            Ok((course, chunks)) => {
                spinner.finish_and_clear();
                Output::success(&format!("Indexed '{}' ({} chunks)", course.title, chunks));
            }
            Err(e) => {
                spinner.finish_and_clear();
                Output::error(&format!("Failed to index document: {}", e));
                return Err(e.into());
            }
        }
        return Ok(());
    }

    let spinner = Output::spinner(&format!("Indexing documents in {}...", path));
    match system.add_course_folder(target, clear).await {
        Ok(result) => {
            spinner.finish_and_clear();
            Output::success("Ingest complete.");
            println!();
            Output::kv("Courses added", &result.courses_added.to_string());
            Output::kv("Chunks indexed", &result.chunks_indexed.to_string());
            if result.skipped > 0 {
                Output::kv("Skipped (already indexed)", &result.skipped.to_string());
            }
            if result.failed > 0 {
                Output::kv("Failed to parse", &result.failed.to_string());
            }
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Ingest failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}

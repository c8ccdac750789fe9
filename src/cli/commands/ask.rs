//! Ask command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::RagSystem;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(
    question: &str,
    session: Option<String>,
    demo: bool,
    mut settings: Settings,
) -> Result<()> {
    if demo {
        settings.demo.enabled = true;
    }

    // Pre-flight checks
    if let Err(e) = preflight::check(Operation::Ask, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'pensum doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let system = RagSystem::new(settings)?;

    let spinner = Output::spinner("Searching course materials...");

    match system.query(question, session.as_deref()).await {
        Ok((answer, sources)) => {
            spinner.finish_and_clear();

            println!("\n{}\n", answer);

            if !sources.is_empty() {
                Output::header("Sources");
                for source in &sources {
                    Output::source(&source.text, source.link.as_deref());
                }
            }
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Failed to generate answer: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}

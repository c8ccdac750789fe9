//! Interactive chat command.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::RagSystem;
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};

/// Run the interactive chat command. One conversation session spans the
/// whole REPL, so follow-up questions can refer back to earlier answers.
pub async fn run_chat(settings: Settings) -> Result<()> {
    // Pre-flight checks
    if let Err(e) = preflight::check(Operation::Ask, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'pensum doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let system = RagSystem::new(settings)?;
    let mut session = system.create_session();

    println!("\n{}", style("Pensum Chat").bold().cyan());
    println!(
        "{}\n",
        style("Ask about your course materials, or 'exit' to quit. Use 'clear' to reset conversation.")
            .dim()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        let bytes = stdin.lock().read_line(&mut input)?;
        if bytes == 0 {
            // EOF, e.g. piped input ran out
            println!();
            break;
        }

        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            Output::info("Goodbye!");
            break;
        }

        if input.eq_ignore_ascii_case("clear") {
            system.clear_session(&session);
            session = system.create_session();
            Output::info("Conversation history cleared.");
            continue;
        }

        match system.query(input, Some(&session)).await {
            Ok((answer, sources)) => {
                println!("\n{} {}\n", style("Pensum:").cyan().bold(), answer);
                if !sources.is_empty() {
                    for source in &sources {
                        Output::source(&source.text, source.link.as_deref());
                    }
                    println!();
                }
            }
            Err(e) => {
                Output::error(&format!("Error: {}", e));
            }
        }
    }

    Ok(())
}

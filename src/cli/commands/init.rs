//! Init command - interactive first-run setup.

use crate::cli::Output;
use crate::config::{EmbeddingProvider, Settings};
use console::style;
use std::io::{self, Write};

/// Run the init command for first-time setup.
pub fn run_init(settings: &Settings) -> anyhow::Result<()> {
    Output::header("Pensum Setup");
    println!();
    println!("Welcome to Pensum! Let's make sure everything is configured correctly.\n");

    // Step 1: Check API keys
    println!("{}", style("Step 1: Checking API configuration").bold().cyan());
    println!();

    if std::env::var("ANTHROPIC_API_KEY").is_err() {
        Output::warning("ANTHROPIC_API_KEY environment variable is not set.");
        println!();
        println!("  Pensum requires an Anthropic API key to answer questions.");
        println!(
            "  Get your API key from: {}",
            style("https://console.anthropic.com/settings/keys").underlined()
        );
        println!();
        println!("  Set it in your shell configuration (~/.bashrc, ~/.zshrc, etc.):");
        println!("  {}", style("export ANTHROPIC_API_KEY='sk-ant-...'").green());
        println!();

        if !prompt_continue("Continue without API key?")? {
            println!();
            Output::info("Setup cancelled. Set your API key and run 'pensum init' again.");
            return Ok(());
        }
    } else {
        Output::success("Anthropic API key is configured!");
    }

    if settings.embedding.provider == EmbeddingProvider::Openai {
        if std::env::var("OPENAI_API_KEY").is_err() {
            println!();
            Output::warning("OPENAI_API_KEY environment variable is not set.");
            println!();
            println!("  Pensum uses OpenAI embeddings to index and search course content.");
            println!(
                "  Get your API key from: {}",
                style("https://platform.openai.com/api-keys").underlined()
            );
            println!();
            println!("  Set it in your shell configuration (~/.bashrc, ~/.zshrc, etc.):");
            println!("  {}", style("export OPENAI_API_KEY='sk-...'").green());
            println!();

            if !prompt_continue("Continue without API key?")? {
                println!();
                Output::info("Setup cancelled. Set your API key and run 'pensum init' again.");
                return Ok(());
            }
        } else {
            Output::success("OpenAI API key is configured!");
        }
    }

    println!();

    // Step 2: Create directories
    println!("{}", style("Step 2: Setting up directories").bold().cyan());
    println!();

    let data_dir = settings.data_dir();
    if !data_dir.exists() {
        std::fs::create_dir_all(&data_dir)?;
        Output::success(&format!("Created data directory: {}", data_dir.display()));
    } else {
        Output::info(&format!("Data directory exists: {}", data_dir.display()));
    }

    println!();

    // Step 3: Create config file
    println!("{}", style("Step 3: Configuration file").bold().cyan());
    println!();

    let config_path = Settings::default_config_path();
    if config_path.exists() {
        Output::info(&format!("Config file exists: {}", config_path.display()));
    } else if prompt_continue("Create default configuration file?")? {
        // Create parent directory if needed
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        settings.save_to(&config_path)?;
        Output::success(&format!("Created config file: {}", config_path.display()));
        println!();
        println!("  Edit your config with: {}", style("pensum config edit").green());
    } else {
        Output::info("Skipped config file creation. Using defaults.");
    }

    println!();

    // Summary
    println!("{}", style("Setup Complete!").bold().green());
    println!();
    println!("Next steps:");
    println!("  {} Check system status", style("pensum doctor").cyan());
    println!("  {} Index your course documents", style("pensum ingest <path>").cyan());
    println!(
        "  {} Ask questions about your materials",
        style("pensum ask \"<question>\"").cyan()
    );
    println!();
    println!("For more help: {}", style("pensum --help").cyan());

    Ok(())
}

/// Prompt user for yes/no confirmation.
fn prompt_continue(message: &str) -> io::Result<bool> {
    print!("{} {} ", style("?").cyan(), message);
    print!("{} ", style("[y/N]").dim());
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    Ok(parse_confirmation(&input))
}

/// Interpret a confirmation answer; anything but yes is no.
fn parse_confirmation(input: &str) -> bool {
    let input = input.trim().to_lowercase();
    input == "y" || input == "yes"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_confirmation_accepts_yes() {
        assert!(parse_confirmation("y\n"));
        assert!(parse_confirmation("Yes\n"));
        assert!(parse_confirmation("  YES  "));
    }

    #[test]
    fn test_parse_confirmation_defaults_to_no() {
        assert!(!parse_confirmation("\n"));
        assert!(!parse_confirmation("n\n"));
        assert!(!parse_confirmation("maybe"));
    }
}

//! CLI module for Pensum.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Pensum - Course Materials RAG
///
/// A CLI tool for indexing course documents and asking questions about them.
/// The name "Pensum" is the Scandinavian word for a course's required reading.
#[derive(Parser, Debug)]
#[command(name = "pensum")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize Pensum and verify system requirements
    Init,

    /// Check system requirements and configuration
    Doctor,

    /// Index course documents from a file or folder
    Ingest {
        /// Course document (.txt/.md) or a folder of documents
        path: String,

        /// Clear all indexed data before ingesting
        #[arg(long)]
        clear: bool,
    },

    /// Ask a question about your course materials
    Ask {
        /// The question to ask
        question: String,

        /// Session ID for continuing a previous conversation
        #[arg(short, long)]
        session: Option<String>,

        /// Skip the LLM and answer from raw search results
        #[arg(long)]
        demo: bool,
    },

    /// Start an interactive chat session
    Chat,

    /// Search course content directly
    Search {
        /// Search query
        query: String,

        /// Restrict results to one course (partial titles work)
        #[arg(long)]
        course: Option<String>,

        /// Restrict results to one lesson number
        #[arg(long)]
        lesson: Option<u32>,

        /// Maximum number of results
        #[arg(long, default_value = "5")]
        limit: usize,
    },

    /// List indexed courses
    Courses,

    /// Start HTTP API server for integration with other systems
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "8000")]
        port: u16,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}

//! Pensum - Course Materials RAG
//!
//! A CLI tool and HTTP API for indexing course documents and answering
//! questions about them with tool-assisted retrieval.
//!
//! The name "Pensum" is the Scandinavian word for a course's required reading.
//!
//! # Overview
//!
//! Pensum allows you to:
//! - Parse structured course documents into lessons and content chunks
//! - Build a searchable vector index of course content
//! - Ask questions and get AI-generated answers with cited sources
//! - Search your course library semantically
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management
//! - `document` - Course document parsing and chunking
//! - `embedding` - Embedding generation
//! - `store` - Course knowledge store (SQLite and in-memory)
//! - `llm` - Completion client abstraction
//! - `agent` - Search tools, tool registry and the tool-calling generator
//! - `session` - Conversation history
//! - `orchestrator` - Query and ingestion coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use pensum::config::Settings;
//! use pensum::orchestrator::RagSystem;
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let system = RagSystem::new(settings)?;
//!
//!     // Index a folder of course documents
//!     let result = system.add_course_folder(Path::new("./docs"), false).await?;
//!     println!("Indexed {} chunks", result.chunks_indexed);
//!
//!     // Ask a question
//!     let (answer, sources) = system.query("What does lesson 1 cover?", None).await?;
//!     println!("{} ({} sources)", answer, sources.len());
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod llm;
pub mod orchestrator;
pub mod session;
pub mod store;

pub use error::{PensumError, Result};

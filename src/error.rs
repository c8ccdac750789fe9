//! Error types for Pensum.

use thiserror::Error;

/// Library-level error type for Pensum operations.
#[derive(Error, Debug)]
pub enum PensumError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Document error: {0}")]
    Document(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Course store error: {0}")]
    Store(String),

    #[error("Completion service error: {0}")]
    Completion(String),

    #[error("Generator error: {0}")]
    Generator(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Tool '{0}' is already registered")]
    DuplicateTool(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("No course found matching '{0}'")]
    CourseNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for Pensum operations.
pub type Result<T> = std::result::Result<T, PensumError>;

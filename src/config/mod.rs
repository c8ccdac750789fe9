//! Configuration module for Pensum.
//!
//! Handles loading and managing application settings.

mod settings;

pub use settings::{
    ChunkingSettings, DemoSettings, EmbeddingProvider, EmbeddingSettings, GeneratorSettings,
    SearchSettings, ServerSettings, SessionSettings, Settings, StorageSettings,
};

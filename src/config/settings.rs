//! Configuration settings for Pensum.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub generator: GeneratorSettings,
    pub embedding: EmbeddingSettings,
    pub storage: StorageSettings,
    pub chunking: ChunkingSettings,
    pub search: SearchSettings,
    pub session: SessionSettings,
    pub server: ServerSettings,
    pub demo: DemoSettings,
}

/// Answer generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorSettings {
    /// Anthropic model for answer generation.
    pub model: String,
    /// Maximum tokens per completion.
    pub max_tokens: u32,
    /// Override the API base URL (for proxies and tests).
    pub base_url: Option<String>,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-20250514".to_string(),
            max_tokens: 800,
            base_url: None,
        }
    }
}

/// Embedding provider type.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// OpenAI embedding API (default).
    #[default]
    Openai,
    /// Deterministic local embeddings, no API traffic.
    Offline,
}

impl std::str::FromStr for EmbeddingProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(EmbeddingProvider::Openai),
            "offline" | "local" => Ok(EmbeddingProvider::Offline),
            _ => Err(format!("Unknown embedding provider: {}", s)),
        }
    }
}

impl std::fmt::Display for EmbeddingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmbeddingProvider::Openai => write!(f, "openai"),
            EmbeddingProvider::Offline => write!(f, "offline"),
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding provider (openai, offline).
    pub provider: EmbeddingProvider,
    /// Embedding model to use (openai provider).
    pub model: String,
    /// Embedding dimensions.
    pub dimensions: u32,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::Openai,
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
        }
    }
}

/// Storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Course database filename inside the data directory.
    pub database: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.pensum".to_string(),
            database: "courses.db".to_string(),
        }
    }
}

/// Document chunking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    /// Target chunk size in characters.
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in characters.
    pub chunk_overlap: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            chunk_size: 800,
            chunk_overlap: 100,
        }
    }
}

/// Search settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Maximum results per search.
    pub max_results: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self { max_results: 5 }
    }
}

/// Session memory settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Exchanges kept per session.
    pub max_history: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self { max_history: 2 }
    }
}

/// HTTP API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

/// Demo mode settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct DemoSettings {
    /// Answer from the search tool directly, without any LLM traffic.
    pub enabled: bool,
}


impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::PensumError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("pensum")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.storage.data_dir)
    }

    /// Get the expanded course database path.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir().join(&self.storage.database)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();

        assert_eq!(settings.generator.model, "claude-sonnet-4-20250514");
        assert_eq!(settings.generator.max_tokens, 800);
        assert_eq!(settings.chunking.chunk_size, 800);
        assert_eq!(settings.chunking.chunk_overlap, 100);
        assert_eq!(settings.search.max_results, 5);
        assert_eq!(settings.session.max_history, 2);
        assert_eq!(settings.embedding.provider, EmbeddingProvider::Openai);
        assert!(!settings.demo.enabled);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut settings = Settings::default();
        settings.generator.model = "claude-3-5-haiku-latest".to_string();
        settings.embedding.provider = EmbeddingProvider::Offline;
        settings.search.max_results = 3;
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.generator.model, "claude-3-5-haiku-latest");
        assert_eq!(loaded.embedding.provider, EmbeddingProvider::Offline);
        assert_eq!(loaded.search.max_results, 3);
    }

    #[test]
    fn test_partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[search]\nmax_results = 7\n").unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.search.max_results, 7);
        assert_eq!(loaded.session.max_history, 2);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let path = PathBuf::from("/nonexistent/pensum-config.toml");
        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.search.max_results, 5);
    }

    #[test]
    fn test_database_path_joins_data_dir() {
        let mut settings = Settings::default();
        settings.storage.data_dir = "/var/lib/pensum".to_string();

        assert_eq!(
            settings.database_path(),
            PathBuf::from("/var/lib/pensum/courses.db")
        );
    }
}

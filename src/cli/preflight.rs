//! Pre-flight checks before expensive operations.
//!
//! Validates that required API keys are configured before starting
//! operations that would otherwise fail midway.

use crate::config::{EmbeddingProvider, Settings};
use crate::error::{PensumError, Result};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Asking questions requires the completion API key.
    Ask,
    /// Ingestion embeds chunks at index time.
    Ingest,
    /// Search embeds the query.
    Search,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Ask => {
            if !settings.demo.enabled {
                check_anthropic_key()?;
            }
            check_embedding_key(settings)?;
        }
        Operation::Ingest | Operation::Search => {
            check_embedding_key(settings)?;
        }
    }
    Ok(())
}

/// Check if the Anthropic API key is configured.
fn check_anthropic_key() -> Result<()> {
    match std::env::var("ANTHROPIC_API_KEY") {
        Ok(key) if !key.is_empty() => Ok(()),
        Ok(_) => Err(PensumError::Config(
            "ANTHROPIC_API_KEY is empty. Set it with: export ANTHROPIC_API_KEY='sk-ant-...'"
                .to_string(),
        )),
        Err(_) => Err(PensumError::Config(
            "ANTHROPIC_API_KEY not set. Set it with: export ANTHROPIC_API_KEY='sk-ant-...'"
                .to_string(),
        )),
    }
}

/// Check the embedding provider's API key. The offline provider needs none.
fn check_embedding_key(settings: &Settings) -> Result<()> {
    if settings.embedding.provider != EmbeddingProvider::Openai {
        return Ok(());
    }
    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if !key.is_empty() => Ok(()),
        Ok(_) => Err(PensumError::Config(
            "OPENAI_API_KEY is empty. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
        Err(_) => Err(PensumError::Config(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_settings() -> Settings {
        let mut settings = Settings::default();
        settings.embedding.provider = EmbeddingProvider::Offline;
        settings
    }

    #[test]
    fn test_search_with_offline_embeddings_passes() {
        // No env vars needed when the embedder runs locally
        assert!(check(Operation::Search, &offline_settings()).is_ok());
    }

    #[test]
    fn test_demo_ask_with_offline_embeddings_passes() {
        let mut settings = offline_settings();
        settings.demo.enabled = true;
        assert!(check(Operation::Ask, &settings).is_ok());
    }
}

//! Offline embedder based on hashed character n-grams.
//!
//! Deterministic and content-dependent but not semantically trained.
//! Good enough for demo mode, tests, and air-gapped ingestion; swap in
//! the OpenAI embedder for real retrieval quality.

use super::Embedder;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};

/// Default vector width. Small keeps the store compact; collisions are
/// acceptable at this quality tier.
const DEFAULT_DIMENSIONS: usize = 256;

/// Common English words that carry no retrieval signal.
const STOP_WORDS: &[&str] = &[
    "the", "is", "at", "which", "on", "a", "an", "as", "are", "was", "were", "for", "to", "of",
    "in", "and", "or", "but", "with", "by", "from", "this", "that", "be", "have", "has", "had",
    "it", "its", "their", "they", "them", "what", "how", "does", "about",
];

/// Hash-based n-gram embedder requiring no network or model files.
#[derive(Debug, Clone)]
pub struct HashedNgramEmbedder {
    dimensions: usize,
}

impl HashedNgramEmbedder {
    pub fn new() -> Self {
        Self {
            dimensions: DEFAULT_DIMENSIONS,
        }
    }

    pub fn with_dimensions(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];

        let stop_words: HashSet<&str> = STOP_WORDS.iter().copied().collect();
        let lower = text.to_lowercase();
        let words: Vec<&str> = lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.len() > 2 && !stop_words.contains(w))
            .collect();

        let mut frequencies: HashMap<&str, u32> = HashMap::new();
        for &word in &words {
            *frequencies.entry(word).or_insert(0) += 1;
        }

        for (word, freq) in &frequencies {
            let weight = (*freq as f32).sqrt();
            let chars: Vec<char> = word.chars().collect();

            // Letter trigrams spread each word over several dimensions so
            // shared morphology pulls related words together.
            for window in chars.windows(3) {
                let slot = hash_chars(window, 37) % self.dimensions as u64;
                vector[slot as usize] += weight;
            }

            // The whole word anchors one dimension of its own.
            let slot = hash_chars(&chars, 31) % self.dimensions as u64;
            vector[slot as usize] += *freq as f32;
        }

        normalize(&mut vector);
        vector
    }
}

impl Default for HashedNgramEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Embedder for HashedNgramEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed_text(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

fn hash_chars(chars: &[char], seed: u64) -> u64 {
    let mut hash = 0u64;
    for c in chars {
        let mut buf = [0u8; 4];
        for b in c.encode_utf8(&mut buf).bytes() {
            hash = hash.wrapping_mul(seed).wrapping_add(b as u64);
        }
    }
    hash
}

fn normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::cosine_similarity;

    #[tokio::test]
    async fn test_embedding_is_unit_length() {
        let embedder = HashedNgramEmbedder::new();
        let embedding = embedder.embed("retrieval augmented generation").await.unwrap();

        assert_eq!(embedding.len(), DEFAULT_DIMENSIONS);
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_embedding_is_deterministic() {
        let embedder = HashedNgramEmbedder::new();
        let first = embedder.embed("model context protocol").await.unwrap();
        let second = embedder.embed("model context protocol").await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_different_texts_differ() {
        let embedder = HashedNgramEmbedder::new();
        let a = embedder.embed("vector databases").await.unwrap();
        let b = embedder.embed("prompt engineering").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_shared_vocabulary_scores_higher() {
        let embedder = HashedNgramEmbedder::new();
        let query = embedder.embed("lesson about embeddings").await.unwrap();
        let related = embedder
            .embed("embeddings turn text into vectors")
            .await
            .unwrap();
        let unrelated = embedder
            .embed("billing invoices ship quarterly")
            .await
            .unwrap();

        assert!(cosine_similarity(&query, &related) > cosine_similarity(&query, &unrelated));
    }

    #[tokio::test]
    async fn test_empty_text_yields_zero_vector() {
        let embedder = HashedNgramEmbedder::new();
        let embedding = embedder.embed("").await.unwrap();
        assert!(embedding.iter().all(|&x| x == 0.0));
    }

    #[tokio::test]
    async fn test_batch_matches_single() {
        let embedder = HashedNgramEmbedder::with_dimensions(64);
        let texts = vec!["one".to_string(), "two".to_string()];
        let batch = embedder.embed_batch(&texts).await.unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0], embedder.embed("one").await.unwrap());
        assert_eq!(batch[1], embedder.embed("two").await.unwrap());
    }

    #[tokio::test]
    async fn test_non_ascii_text_is_safe() {
        let embedder = HashedNgramEmbedder::new();
        let embedding = embedder.embed("kursmateriale på norsk 🎓").await.unwrap();
        assert_eq!(embedding.len(), DEFAULT_DIMENSIONS);
    }
}

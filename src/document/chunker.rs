//! Sentence-window text chunking.
//!
//! Chunks are built from whole sentences up to a character limit, with
//! a configurable sentence overlap between consecutive chunks so that
//! context spanning a boundary survives retrieval.

/// Chunk sizing parameters, in characters.
#[derive(Debug, Clone, Copy)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 800,
            chunk_overlap: 100,
        }
    }
}

/// Split text into sentence-aligned chunks.
///
/// Sentences are never split: a sentence longer than the chunk size
/// becomes a chunk of its own.
pub fn chunk_text(text: &str, config: &ChunkingConfig) -> Vec<String> {
    let sentences = split_sentences(text);
    if sentences.is_empty() {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < sentences.len() {
        let mut end = start;
        let mut size = 0;

        while end < sentences.len() {
            let sentence_len = sentences[end].chars().count();
            let added = sentence_len + if size > 0 { 1 } else { 0 };
            if size > 0 && size + added > config.chunk_size {
                break;
            }
            size += added;
            end += 1;
        }

        chunks.push(sentences[start..end].join(" "));

        if end >= sentences.len() {
            break;
        }
        // Carry trailing sentences into the next chunk, up to the
        // configured overlap, while guaranteeing forward progress.
        start = overlap_start(&sentences, end, config.chunk_overlap).max(start + 1);
    }

    chunks
}

/// Split text into sentences on `.`, `!` or `?` followed by whitespace.
/// Whitespace is normalized first, so newlines inside a sentence do not
/// create boundaries.
pub fn split_sentences(text: &str) -> Vec<String> {
    let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");

    let mut sentences = Vec::new();
    let mut start = 0;
    let mut prev_terminal = false;

    for (idx, ch) in normalized.char_indices() {
        if prev_terminal && ch.is_whitespace() {
            let sentence = normalized[start..idx].trim();
            if !sentence.is_empty() {
                sentences.push(sentence.to_string());
            }
            start = idx;
        }
        prev_terminal = matches!(ch, '.' | '!' | '?');
    }

    let tail = normalized[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail.to_string());
    }

    sentences
}

fn overlap_start(sentences: &[String], end: usize, overlap: usize) -> usize {
    let mut start = end;
    let mut carried = 0;
    while start > 0 {
        let len = sentences[start - 1].chars().count();
        if carried + len > overlap {
            break;
        }
        carried += len;
        start -= 1;
    }
    start
}

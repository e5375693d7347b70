#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use std::ops::Range;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_WINDOW: usize = 512;
pub const DEFAULT_OVERLAP: usize = 64;

/// Configuration for word-window chunking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Number of whitespace-delimited tokens per chunk
    pub window: usize,
    /// Number of tokens shared by consecutive chunks
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    #[inline]
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            overlap: DEFAULT_OVERLAP,
        }
    }
}

impl ChunkingConfig {
    /// Chunk `text` with this configuration
    #[inline]
    pub fn chunk(&self, text: &str) -> Result<Vec<String>, ChunkingError> {
        chunk_text(text, self.window, self.overlap)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChunkingError {
    #[error("Chunk window must be at least one token")]
    ZeroWindow,
    #[error("Chunk overlap ({overlap}) must be smaller than the window ({window})")]
    OverlapTooLarge { window: usize, overlap: usize },
}

/// Token ranges of each chunk, in order.
///
/// Chunk `i` covers tokens `i * (window - overlap)` up to `window` tokens past that,
/// clipped to the token count. The last range may be shorter than `window`.
#[inline]
pub fn chunk_spans(
    text: &str,
    window: usize,
    overlap: usize,
) -> Result<Vec<Range<usize>>, ChunkingError> {
    let token_count = text.split_whitespace().count();
    spans_for(token_count, window, overlap)
}

/// Split text into overlapping word windows joined by single spaces
#[inline]
pub fn chunk_text(text: &str, window: usize, overlap: usize) -> Result<Vec<String>, ChunkingError> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let spans = spans_for(tokens.len(), window, overlap)?;

    let chunks: Vec<String> = spans
        .into_iter()
        .map(|span| tokens[span].join(" "))
        .collect();

    debug!(
        "Chunked {} tokens into {} chunks (window {}, overlap {})",
        tokens.len(),
        chunks.len(),
        window,
        overlap
    );

    Ok(chunks)
}

fn spans_for(
    token_count: usize,
    window: usize,
    overlap: usize,
) -> Result<Vec<Range<usize>>, ChunkingError> {
    if window == 0 {
        return Err(ChunkingError::ZeroWindow);
    }
    if overlap >= window {
        return Err(ChunkingError::OverlapTooLarge { window, overlap });
    }

    let stride = window - overlap;
    let spans = (0..token_count)
        .step_by(stride)
        .map(|start| start..(start + window).min(token_count))
        .collect();

    Ok(spans)
}

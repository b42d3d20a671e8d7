//! Sliding-window text chunker.
//!
//! Text is split into whitespace-delimited tokens. A window of
//! `window_size` tokens slides forward by `window_size - overlap` tokens at a
//! time, and each window becomes one chunk joined with single spaces.
//!
//! ```text
//! tokens:  0 ............................................ 1199
//! chunk 0: [0, 500)
//! chunk 1:                 [450, 950)
//! chunk 2:                                  [900, 1200)
//! ```
//!
//! Windows keep starting every stride while the start offset is inside the
//! token sequence, so a short trailing window already contained in the
//! previous chunk is still emitted.

use thiserror::Error;

/// Default tokens per chunk.
pub const DEFAULT_WINDOW_SIZE: usize = 500;
/// Default tokens shared by neighbouring chunks.
pub const DEFAULT_OVERLAP: usize = 50;

/// Invalid chunking parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ChunkingConfigError {
    #[error("window size must be greater than zero")]
    ZeroWindow,
    #[error("overlap ({overlap}) must be smaller than the window size ({window_size})")]
    OverlapTooLarge { window_size: usize, overlap: usize },
}

/// Window and overlap, in tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingConfig {
    window_size: usize,
    overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            overlap: DEFAULT_OVERLAP,
        }
    }
}

impl ChunkingConfig {
    /// Create a validated config.
    ///
    /// # Errors
    ///
    /// Returns an error if `window_size` is zero or `overlap >= window_size`.
    pub const fn new(window_size: usize, overlap: usize) -> Result<Self, ChunkingConfigError> {
        if window_size == 0 {
            return Err(ChunkingConfigError::ZeroWindow);
        }
        if overlap >= window_size {
            return Err(ChunkingConfigError::OverlapTooLarge {
                window_size,
                overlap,
            });
        }
        Ok(Self {
            window_size,
            overlap,
        })
    }

    #[must_use]
    pub const fn window_size(&self) -> usize {
        self.window_size
    }

    #[must_use]
    pub const fn overlap(&self) -> usize {
        self.overlap
    }

    /// Tokens between consecutive window starts. Always at least 1.
    #[must_use]
    pub const fn stride(&self) -> usize {
        self.window_size - self.overlap
    }
}

/// One window of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    /// Position of this chunk within its document.
    pub sequence_index: usize,
    /// Offset of the first token.
    pub start_token: usize,
    /// Number of tokens in the chunk.
    pub token_count: usize,
    /// Tokens joined with single spaces.
    pub text: String,
}

/// Split `text` into overlapping windows.
///
/// Returns an empty list when the text has no tokens.
#[must_use]
pub fn chunk_text(text: &str, config: ChunkingConfig) -> Vec<TextChunk> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let stride = config.stride();

    (0..tokens.len())
        .step_by(stride)
        .filter_map(|start| {
            let end = (start + config.window_size).min(tokens.len());
            tokens.get(start..end)
        })
        .enumerate()
        .map(|(sequence_index, window)| TextChunk {
            sequence_index,
            start_token: sequence_index * stride,
            token_count: window.len(),
            text: window.join(" "),
        })
        .collect()
}

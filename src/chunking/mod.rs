//! Transcript chunking.
//!
//! Splits a transcript into overlapping segments that are small enough to
//! embed and to fit several of them into one prompt.

mod recursive;

pub use recursive::{RecursiveSplitter, DEFAULT_SEPARATORS};

use crate::error::{Result, VidqaError};
use serde::{Deserialize, Serialize};

/// A bounded piece of a transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// Text content, always equal to `transcript[start..end]`.
    pub text: String,
    /// Order of this segment in the transcript.
    pub position: usize,
    /// Byte offset where the segment starts in the transcript.
    pub start: usize,
    /// Byte offset one past the segment's end.
    pub end: usize,
}

impl Segment {
    /// Length in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Validated chunking parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChunkingConfig {
    /// Maximum segment length in characters.
    chunk_size: usize,
    /// Characters shared between consecutive segments.
    chunk_overlap: usize,
}

impl ChunkingConfig {
    /// Create a config, rejecting `chunk_size == 0` and `chunk_overlap >= chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(VidqaError::Config(
                "chunk_size must be greater than 0".to_string(),
            ));
        }
        if chunk_overlap >= chunk_size {
            return Err(VidqaError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                chunk_overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1500,
            chunk_overlap: 200,
        }
    }
}

/// Split a transcript with the default separators.
///
/// An empty or whitespace-only transcript yields no segments.
pub fn split(transcript: &str, chunk_size: usize, chunk_overlap: usize) -> Result<Vec<Segment>> {
    let config = ChunkingConfig::new(chunk_size, chunk_overlap)?;
    Ok(RecursiveSplitter::new(config).split(transcript))
}

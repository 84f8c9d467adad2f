//! In-memory similarity index over embedded segments.
//!
//! An index is built once per transcript and never mutated afterwards.

use crate::chunking::Segment;
use crate::embedding::EmbeddingVector;
use crate::error::{Result, VidqaError};

/// A query hit.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredSegment {
    pub segment: Segment,
    /// Cosine similarity to the query (higher is better).
    pub score: f32,
}

/// Immutable collection of segments and their embeddings.
#[derive(Debug, Clone)]
pub struct SegmentIndex {
    entries: Vec<(Segment, EmbeddingVector)>,
    dimensions: usize,
}

impl SegmentIndex {
    /// Pair segments with their vectors.
    ///
    /// Fails on a length mismatch or empty input. Vectors must be non-empty,
    /// finite, and share one dimension.
    pub fn build(segments: Vec<Segment>, vectors: Vec<EmbeddingVector>) -> Result<Self> {
        if segments.len() != vectors.len() {
            return Err(VidqaError::Index(format!(
                "{} segments but {} vectors",
                segments.len(),
                vectors.len()
            )));
        }
        let dimensions = match vectors.first() {
            Some(v) => v.len(),
            None => return Err(VidqaError::Index("nothing to index".to_string())),
        };
        if dimensions == 0 {
            return Err(VidqaError::Index("embedding vectors are empty".to_string()));
        }
        if let Some(i) = vectors.iter().position(|v| v.len() != dimensions) {
            return Err(VidqaError::Index(format!(
                "vector {} has {} dimensions, expected {}",
                i,
                vectors[i].len(),
                dimensions
            )));
        }
        if let Some(i) = vectors.iter().position(|v| !is_finite(v)) {
            return Err(VidqaError::Index(format!(
                "vector {} has non-finite components",
                i
            )));
        }

        Ok(Self {
            entries: segments.into_iter().zip(vectors).collect(),
            dimensions,
        })
    }

    /// Return the `k` segments most similar to `vector`, best first.
    ///
    /// Equal scores keep insertion order. `k == 0` yields nothing and a `k`
    /// larger than the index yields every segment.
    pub fn query(&self, vector: &[f32], k: usize) -> Result<Vec<ScoredSegment>> {
        if vector.len() != self.dimensions {
            return Err(VidqaError::Index(format!(
                "query has {} dimensions, index has {}",
                vector.len(),
                self.dimensions
            )));
        }
        if !is_finite(vector) {
            return Err(VidqaError::Index(
                "query vector has non-finite components".to_string(),
            ));
        }
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut results: Vec<ScoredSegment> = self
            .entries
            .iter()
            .map(|(segment, embedding)| ScoredSegment {
                segment: segment.clone(),
                score: cosine_similarity(vector, embedding),
            })
            .collect();

        // sort_by is stable, so ties stay in insertion order
        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results.truncate(k);

        Ok(results)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn is_finite(vector: &[f32]) -> bool {
    vector.iter().all(|x| x.is_finite())
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

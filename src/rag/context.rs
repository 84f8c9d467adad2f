//! Retrieval of transcript context for a question.

use crate::config::NO_CONTEXT;
use crate::embedding::Embedder;
use crate::error::{with_timeout, Result};
use crate::index::{ScoredSegment, SegmentIndex};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Separator placed between retrieved segments in the prompt.
pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// Segments retrieved for one question.
#[derive(Debug, Clone, PartialEq)]
pub enum RetrievedContext {
    /// Retrieval produced nothing; rendered as `NO_CONTEXT`.
    NoContext,
    /// Segments in descending score order.
    Segments(Vec<ScoredSegment>),
}

impl RetrievedContext {
    /// Wrap query results, mapping an empty result to [`RetrievedContext::NoContext`].
    pub fn from_results(results: Vec<ScoredSegment>) -> Self {
        if results.is_empty() {
            RetrievedContext::NoContext
        } else {
            RetrievedContext::Segments(results)
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, RetrievedContext::NoContext)
    }

    pub fn segments(&self) -> &[ScoredSegment] {
        match self {
            RetrievedContext::NoContext => &[],
            RetrievedContext::Segments(segments) => segments,
        }
    }

    /// Text inserted into the prompt.
    pub fn render(&self) -> String {
        match self {
            RetrievedContext::NoContext => NO_CONTEXT.to_string(),
            RetrievedContext::Segments(segments) => segments
                .iter()
                .map(|s| s.segment.text.as_str())
                .collect::<Vec<_>>()
                .join(CONTEXT_SEPARATOR),
        }
    }
}

impl fmt::Display for RetrievedContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Embed `question` and fetch the `k` best segments from `index`.
pub async fn retrieve(
    question: &str,
    index: &SegmentIndex,
    k: usize,
    embedder: &dyn Embedder,
) -> Result<RetrievedContext> {
    if k == 0 || index.is_empty() {
        return Ok(RetrievedContext::NoContext);
    }

    let query = embedder.embed(question).await?;
    let results = index.query(&query, k)?;
    debug!("Retrieved {} of {} segments", results.len(), index.len());

    Ok(RetrievedContext::from_results(results))
}

/// Retrieves context with a fixed `k` and an embedding timeout.
#[derive(Clone)]
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    k: usize,
    timeout: Duration,
}

impl Retriever {
    /// Create a retriever returning the top 2 segments.
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            k: 2,
            timeout: Duration::from_secs(60),
        }
    }

    /// Set the number of segments to retrieve.
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    /// Set the timeout for embedding the question.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Retrieve context for a question.
    pub async fn retrieve(&self, question: &str, index: &SegmentIndex) -> Result<RetrievedContext> {
        with_timeout(
            "embedding service",
            self.timeout,
            retrieve(question, index, self.k, self.embedder.as_ref()),
        )
        .await
    }
}

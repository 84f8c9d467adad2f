//! Per-user question answering session.
//!
//! A session owns at most one transcript index. Loading a transcript moves it
//! through `Empty -> Building -> Ready | Error`; only a `Ready` session answers
//! questions.

use crate::error::{Result, VidqaError};
use crate::index::SegmentIndex;
use crate::rag::Answer;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// Lifecycle of a session's transcript index.
#[derive(Debug, Clone)]
pub enum SessionState {
    /// No transcript loaded yet.
    Empty,
    /// A transcript is being split and embedded.
    Building,
    /// The index is built and questions are accepted.
    Ready(Arc<SegmentIndex>),
    /// The last load failed. No index is retained.
    Error(String),
}

impl SessionState {
    /// Short lowercase name, used in logs and HTTP responses.
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Empty => "empty",
            SessionState::Building => "building",
            SessionState::Ready(_) => "ready",
            SessionState::Error(_) => "error",
        }
    }
}

/// One question and its answer, kept for display.
#[derive(Debug, Clone, Serialize)]
pub struct ChatTurn {
    pub question: String,
    pub answer: String,
    pub is_error: bool,
    pub asked_at: DateTime<Utc>,
}

/// Result of loading a transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadOutcome {
    pub ready: bool,
    pub error: Option<String>,
    /// Number of indexed segments.
    pub segments: usize,
}

impl LoadOutcome {
    pub fn ready(segments: usize) -> Self {
        Self {
            ready: true,
            error: None,
            segments,
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            ready: false,
            error: Some(reason.into()),
            segments: 0,
        }
    }
}

/// Result of asking a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AskOutcome {
    pub answer: Option<String>,
    pub error: Option<String>,
}

impl AskOutcome {
    pub fn answered(answer: impl Into<String>) -> Self {
        Self {
            answer: Some(answer.into()),
            error: None,
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            answer: None,
            error: Some(reason.into()),
        }
    }
}

/// A caller-owned session.
#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    created_at: DateTime<Utc>,
    state: SessionState,
    history: Vec<ChatTurn>,
    generation: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            state: SessionState::Empty,
            history: Vec::new(),
            generation: 0,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn history(&self) -> &[ChatTurn] {
        &self.history
    }

    /// Counter bumped by every transcript load.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, SessionState::Ready(_))
    }

    /// Number of segments in the current index, 0 unless ready.
    pub fn segment_count(&self) -> usize {
        match &self.state {
            SessionState::Ready(index) => index.len(),
            _ => 0,
        }
    }

    /// Start loading a new transcript.
    ///
    /// Drops any previous index and history and returns the generation that
    /// must be handed back to [`Session::finish_build`].
    pub fn begin_build(&mut self) -> u64 {
        self.generation += 1;
        self.state = SessionState::Building;
        self.history.clear();
        self.generation
    }

    /// Apply the result of a build started with [`Session::begin_build`].
    ///
    /// A result from a superseded build is discarded and leaves the state alone.
    pub fn finish_build(&mut self, generation: u64, result: Result<SegmentIndex>) -> LoadOutcome {
        if generation != self.generation {
            return LoadOutcome::failed("superseded by a newer transcript load");
        }

        match result {
            Ok(index) => {
                let segments = index.len();
                self.state = SessionState::Ready(Arc::new(index));
                LoadOutcome::ready(segments)
            }
            Err(e) => {
                let reason = e.to_string();
                self.state = SessionState::Error(reason.clone());
                LoadOutcome::failed(reason)
            }
        }
    }

    /// The index to answer from, if the session is ready.
    pub fn index(&self) -> Result<Arc<SegmentIndex>> {
        match &self.state {
            SessionState::Ready(index) => Ok(Arc::clone(index)),
            SessionState::Empty => Err(VidqaError::SessionNotReady(
                "no transcript has been loaded".to_string(),
            )),
            SessionState::Building => Err(VidqaError::SessionNotReady(
                "the transcript is still being processed".to_string(),
            )),
            SessionState::Error(reason) => Err(VidqaError::SessionNotReady(format!(
                "the last transcript failed to load: {}",
                reason
            ))),
        }
    }

    /// Append a question and its answer to the history.
    pub fn record(&mut self, question: &str, answer: &Answer) {
        self.history.push(ChatTurn {
            question: question.to_string(),
            answer: answer.text.clone(),
            is_error: answer.is_error(),
            asked_at: Utc::now(),
        });
    }
}

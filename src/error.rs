//! Error types for vidqa.

use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Library-level error type for vidqa operations.
#[derive(Error, Debug)]
pub enum VidqaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("no content to process after splitting")]
    NoContent,

    #[error("Transcript unavailable: {0}")]
    TranscriptUnavailable(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Language model error: {0}")]
    Llm(String),

    #[error("{operation} timed out after {limit:?}")]
    Timeout {
        operation: &'static str,
        limit: Duration,
    },

    #[error("Index error: {0}")]
    Index(String),

    #[error("Session not ready: {0}")]
    SessionNotReady(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("External tool failed: {0}")]
    ToolFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Coarse classification of failures, used to pick user-facing wording
/// and HTTP status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Malformed or empty input (bad URL, empty transcript, empty question).
    Input,
    /// Captions disabled, video unavailable, no usable transcript.
    TranscriptUnavailable,
    /// Embedding or language-model backend failure, including timeouts.
    Service,
    /// Invalid settings or chunking parameters.
    Config,
    /// Operation not allowed in the current session state.
    Usage,
    Internal,
}

impl VidqaError {
    /// Classify this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            VidqaError::InvalidInput(_) | VidqaError::NoContent => ErrorCategory::Input,
            VidqaError::TranscriptUnavailable(_)
            | VidqaError::ToolNotFound(_)
            | VidqaError::ToolFailed(_) => ErrorCategory::TranscriptUnavailable,
            VidqaError::Embedding(_)
            | VidqaError::Llm(_)
            | VidqaError::Timeout { .. }
            | VidqaError::Http(_) => ErrorCategory::Service,
            VidqaError::Config(_) | VidqaError::TomlParse(_) => ErrorCategory::Config,
            VidqaError::SessionNotReady(_) => ErrorCategory::Usage,
            VidqaError::Index(_) | VidqaError::Io(_) | VidqaError::Json(_) => {
                ErrorCategory::Internal
            }
        }
    }
}

/// Result type alias for vidqa operations.
pub type Result<T> = std::result::Result<T, VidqaError>;

/// Await `future`, failing with [`VidqaError::Timeout`] once `limit` elapses.
pub async fn with_timeout<T, F>(operation: &'static str, limit: Duration, future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, future).await {
        Ok(result) => result,
        Err(_) => Err(VidqaError::Timeout {
            operation,
            limit,
        }),
    }
}

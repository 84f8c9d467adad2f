//! Transcript retrieval for YouTube videos.
//!
//! A [`TranscriptSource`] lists and downloads caption tracks;
//! [`fetch_transcript`] decides which track to use.

mod youtube;

pub use youtube::{extract_video_id, watch_url, YtDlpSource};

use crate::error::VidqaError;
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use tracing::{debug, info, warn};

/// A caption track offered for a video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Track {
    pub video_id: String,
    /// Language code, e.g. "en".
    pub language_code: String,
    /// Human readable language name, e.g. "English".
    pub language: String,
    /// Whether the track was generated by speech recognition.
    pub is_generated: bool,
    /// Where the caption data can be downloaded.
    pub url: String,
}

/// Failures reported by a [`TranscriptSource`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("transcripts are disabled")]
    TranscriptsDisabled,

    #[error("video is unavailable")]
    VideoUnavailable,

    #[error("{0}")]
    Failed(String),
}

/// Lists and downloads caption tracks.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// All tracks for a video, manual tracks before generated ones.
    async fn list_tracks(&self, video_id: &str) -> Result<Vec<Track>, SourceError>;

    /// The caption lines of one track.
    async fn fetch_track(&self, track: &Track) -> Result<Vec<String>, SourceError>;
}

/// Outcome of a transcript fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchStatus {
    Success {
        language_code: String,
        language: String,
        /// True when the requested language was missing and another track was used.
        fallback: bool,
    },
    InvalidUrl,
    TranscriptsDisabled,
    VideoUnavailable,
    /// The video has no caption tracks at all.
    NoTranscripts,
    /// The requested track exists but holds no captions.
    NoTranscriptFound(String),
    /// The fallback track holds no captions.
    EmptyTranscript,
    Failed(String),
}

impl FetchStatus {
    /// Status message shown to users.
    pub fn message(&self) -> String {
        match self {
            FetchStatus::Success {
                language_code,
                fallback: false,
                ..
            } => format!("Transcript successfully extracted in {}!", language_code),
            FetchStatus::Success {
                language,
                fallback: true,
                ..
            } => format!("Transcript extracted in {} (fallback)", language),
            FetchStatus::InvalidUrl => "Invalid URL format or missing video ID.".to_string(),
            FetchStatus::TranscriptsDisabled => {
                "Transcripts are disabled for this video.".to_string()
            }
            FetchStatus::VideoUnavailable => "Video is unavailable or private.".to_string(),
            FetchStatus::NoTranscripts => "No transcripts available for this video.".to_string(),
            FetchStatus::NoTranscriptFound(code) => format!("No transcript found in {}.", code),
            FetchStatus::EmptyTranscript => "Failed to fetch transcript data.".to_string(),
            FetchStatus::Failed(reason) => {
                format!("Could not access video transcripts. Error: {}", reason)
            }
        }
    }

    /// The error equivalent of a failed status.
    pub fn error(&self) -> Option<VidqaError> {
        match self {
            FetchStatus::Success { .. } => None,
            FetchStatus::InvalidUrl => Some(VidqaError::InvalidInput(self.message())),
            _ => Some(VidqaError::TranscriptUnavailable(self.message())),
        }
    }
}

impl fmt::Display for FetchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

/// A transcript and how it was obtained.
#[derive(Debug, Clone)]
pub struct TranscriptFetch {
    pub video_id: Option<String>,
    pub text: Option<String>,
    pub status: FetchStatus,
}

impl TranscriptFetch {
    fn failed(video_id: Option<String>, status: FetchStatus) -> Self {
        Self {
            video_id,
            text: None,
            status,
        }
    }

    /// The transcript text, or the error describing why there is none.
    pub fn into_text(self) -> crate::error::Result<String> {
        match (self.text, self.status.error()) {
            (Some(text), None) => Ok(text),
            (_, Some(e)) => Err(e),
            (None, None) => Err(VidqaError::TranscriptUnavailable(
                "Failed to fetch transcript data.".to_string(),
            )),
        }
    }
}

impl From<SourceError> for FetchStatus {
    fn from(error: SourceError) -> Self {
        match error {
            SourceError::TranscriptsDisabled => FetchStatus::TranscriptsDisabled,
            SourceError::VideoUnavailable => FetchStatus::VideoUnavailable,
            SourceError::Failed(reason) => FetchStatus::Failed(reason),
        }
    }
}

/// Pick the track for `language`: a manual track if there is one, else a
/// generated one.
pub fn find_track<'a>(tracks: &'a [Track], language: &str) -> Option<&'a Track> {
    tracks
        .iter()
        .filter(|t| t.language_code == language)
        .min_by_key(|t| t.is_generated)
}

/// First track in listing order, manual tracks before generated ones.
pub fn fallback_track(tracks: &[Track]) -> Option<&Track> {
    tracks
        .iter()
        .find(|t| !t.is_generated)
        .or_else(|| tracks.first())
}

/// List the tracks available for a video URL or id.
pub async fn list_languages(
    source: &dyn TranscriptSource,
    input: &str,
) -> crate::error::Result<Vec<Track>> {
    let video_id = extract_video_id(input)
        .ok_or_else(|| VidqaError::InvalidInput(FetchStatus::InvalidUrl.message()))?;

    source.list_tracks(&video_id).await.map_err(|e| {
        let status = FetchStatus::from(e);
        status
            .error()
            .unwrap_or_else(|| VidqaError::TranscriptUnavailable(status.message()))
    })
}

/// Fetch the transcript of a video in `language`, falling back to the first
/// available track when that language is missing.
///
/// Never fails: problems are reported through [`TranscriptFetch::status`].
pub async fn fetch_transcript(
    source: &dyn TranscriptSource,
    input: &str,
    language: &str,
) -> TranscriptFetch {
    let video_id = match extract_video_id(input) {
        Some(id) => id,
        None => return TranscriptFetch::failed(None, FetchStatus::InvalidUrl),
    };

    let tracks = match source.list_tracks(&video_id).await {
        Ok(tracks) => tracks,
        Err(e) => {
            warn!("Could not list transcripts for {}: {}", video_id, e);
            return TranscriptFetch::failed(Some(video_id), e.into());
        }
    };
    debug!("Video {} has {} caption tracks", video_id, tracks.len());

    let (track, fallback) = match find_track(&tracks, language) {
        Some(track) => (track, false),
        None => match fallback_track(&tracks) {
            Some(track) => {
                info!(
                    "No {} transcript for {}, falling back to {}",
                    language, video_id, track.language_code
                );
                (track, true)
            }
            None => return TranscriptFetch::failed(Some(video_id), FetchStatus::NoTranscripts),
        },
    };

    let lines = match source.fetch_track(track).await {
        Ok(lines) => lines,
        Err(e) => {
            warn!("Could not download {} captions: {}", track.language_code, e);
            return TranscriptFetch::failed(Some(video_id), e.into());
        }
    };

    let text = lines
        .iter()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    if text.is_empty() {
        let status = if fallback {
            FetchStatus::EmptyTranscript
        } else {
            FetchStatus::NoTranscriptFound(language.to_string())
        };
        return TranscriptFetch::failed(Some(video_id), status);
    }

    TranscriptFetch {
        video_id: Some(video_id),
        text: Some(text),
        status: FetchStatus::Success {
            language_code: track.language_code.clone(),
            language: track.language.clone(),
            fallback,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{track, FakeSource};

    const VIDEO: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

    #[tokio::test]
    async fn test_requested_language() {
        let source = FakeSource::new(vec![
            (track("de", "German", false), vec!["Hallo", "Welt"]),
            (track("en", "English", false), vec!["Hello", "world"]),
        ]);

        let fetch = fetch_transcript(&source, VIDEO, "en").await;
        assert_eq!(fetch.video_id.as_deref(), Some("dQw4w9WgXcQ"));
        assert_eq!(fetch.text.as_deref(), Some("Hello world"));
        assert_eq!(fetch.status.message(), "Transcript successfully extracted in en!");
    }

    #[tokio::test]
    async fn test_manual_track_preferred() {
        let source = FakeSource::new(vec![
            (track("en", "English (auto-generated)", true), vec!["auto"]),
            (track("en", "English", false), vec!["manual"]),
        ]);

        let fetch = fetch_transcript(&source, VIDEO, "en").await;
        assert_eq!(fetch.text.as_deref(), Some("manual"));
    }

    #[tokio::test]
    async fn test_falls_back_to_first_manual_track() {
        let source = FakeSource::new(vec![
            (track("fr", "French (auto-generated)", true), vec!["bonjour"]),
            (track("de", "German", false), vec!["Hallo"]),
        ]);

        let fetch = fetch_transcript(&source, VIDEO, "en").await;
        assert_eq!(fetch.text.as_deref(), Some("Hallo"));
        assert_eq!(fetch.status.message(), "Transcript extracted in German (fallback)");
        assert!(matches!(fetch.status, FetchStatus::Success { fallback: true, .. }));
    }

    #[tokio::test]
    async fn test_invalid_url() {
        let source = FakeSource::new(vec![]);
        let fetch = fetch_transcript(&source, "https://example.com/video", "en").await;
        assert_eq!(fetch.status, FetchStatus::InvalidUrl);
        assert_eq!(fetch.status.message(), "Invalid URL format or missing video ID.");
        assert!(matches!(fetch.into_text(), Err(VidqaError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_listing_errors_keep_their_cause() {
        let disabled = FakeSource::failing(SourceError::TranscriptsDisabled);
        let fetch = fetch_transcript(&disabled, VIDEO, "en").await;
        assert_eq!(fetch.status.message(), "Transcripts are disabled for this video.");

        let unavailable = FakeSource::failing(SourceError::VideoUnavailable);
        let fetch = fetch_transcript(&unavailable, VIDEO, "en").await;
        assert_eq!(fetch.status.message(), "Video is unavailable or private.");
        assert!(matches!(
            fetch.into_text(),
            Err(VidqaError::TranscriptUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_no_tracks() {
        let source = FakeSource::new(vec![]);
        let fetch = fetch_transcript(&source, VIDEO, "en").await;
        assert_eq!(fetch.status, FetchStatus::NoTranscripts);
    }

    #[tokio::test]
    async fn test_empty_tracks() {
        let source = FakeSource::new(vec![(track("en", "English", false), vec!["", "  "])]);
        let fetch = fetch_transcript(&source, VIDEO, "en").await;
        assert_eq!(fetch.status.message(), "No transcript found in en.");

        let source = FakeSource::new(vec![(track("de", "German", false), vec![])]);
        let fetch = fetch_transcript(&source, VIDEO, "en").await;
        assert_eq!(fetch.status, FetchStatus::EmptyTranscript);
    }

    #[tokio::test]
    async fn test_list_languages() {
        let source = FakeSource::new(vec![(track("en", "English", false), vec!["hi"])]);
        let tracks = list_languages(&source, "dQw4w9WgXcQ").await.unwrap();
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].language, "English");

        assert!(list_languages(&source, "not a video").await.is_err());
    }
}

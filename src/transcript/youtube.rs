//! YouTube captions via yt-dlp.

use super::{SourceError, Track, TranscriptSource};
use crate::config::TranscriptSettings;
use crate::error::{with_timeout, Result, VidqaError};
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;
use url::Url;

static VIDEO_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)
        (?:
            # Short links and full YouTube URLs
            youtu\.be/
            |
            youtube\.com.*(?:[?&]v=|/embed/|/shorts/|/v/)
        )
        ([a-zA-Z0-9_-]{11})
        |
        # Bare video ID (11 characters)
        ^([a-zA-Z0-9_-]{11})$
    ",
    )
    .expect("Invalid regex")
});

/// Extract the video ID from a YouTube URL or bare ID.
pub fn extract_video_id(input: &str) -> Option<String> {
    let caps = VIDEO_ID.captures(input.trim())?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str().to_string())
}

/// Canonical watch page of a video.
pub fn watch_url(video_id: &str) -> Result<Url> {
    Url::parse_with_params("https://www.youtube.com/watch", &[("v", video_id)])
        .map_err(|e| VidqaError::InvalidInput(format!("Invalid video ID {}: {}", video_id, e)))
}

/// Lists caption tracks with `yt-dlp` and downloads them as `json3`.
pub struct YtDlpSource {
    ytdlp_path: String,
    timeout: Duration,
    http: reqwest::Client,
}

impl YtDlpSource {
    pub fn new(settings: &TranscriptSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout())
            .build()?;

        Ok(Self {
            ytdlp_path: settings.ytdlp_path.clone(),
            timeout: settings.timeout(),
            http,
        })
    }

    async fn run_ytdlp(&self, video_id: &str) -> Result<std::process::Output> {
        let url = watch_url(video_id)?;

        with_timeout("yt-dlp", self.timeout, async {
            Command::new(&self.ytdlp_path)
                .args(["--dump-json", "--skip-download", "--no-warnings", url.as_str()])
                .output()
                .await
                .map_err(|e| {
                    if e.kind() == std::io::ErrorKind::NotFound {
                        VidqaError::ToolNotFound(self.ytdlp_path.clone())
                    } else {
                        VidqaError::ToolFailed(format!("Failed to run yt-dlp: {}", e))
                    }
                })
        })
        .await
    }
}

/// Map yt-dlp's stderr onto a source error.
fn classify_failure(stderr: &str) -> SourceError {
    let lowered = stderr.to_lowercase();
    if lowered.contains("private video")
        || lowered.contains("video unavailable")
        || lowered.contains("this video is unavailable")
    {
        SourceError::VideoUnavailable
    } else {
        SourceError::Failed(format!("yt-dlp failed: {}", stderr.trim()))
    }
}

/// Caption tracks in a yt-dlp info document, manual tracks first.
///
/// Tracks without a `json3` format and machine translations are skipped.
fn parse_tracks(video_id: &str, info: &serde_json::Value) -> Vec<Track> {
    let mut tracks = tracks_from(video_id, &info["subtitles"], false);
    tracks.extend(tracks_from(video_id, &info["automatic_captions"], true));
    tracks
}

fn tracks_from(video_id: &str, captions: &serde_json::Value, is_generated: bool) -> Vec<Track> {
    let Some(languages) = captions.as_object() else {
        return Vec::new();
    };

    languages
        .iter()
        .filter(|(code, _)| code.as_str() != "live_chat")
        .filter_map(|(code, formats)| {
            let formats = formats.as_array()?;
            let json3 = formats.iter().find(|f| f["ext"] == "json3")?;
            let url = json3["url"].as_str()?;
            if url.contains("tlang=") {
                return None;
            }
            let language = formats
                .iter()
                .find_map(|f| f["name"].as_str())
                .unwrap_or(code);

            Some(Track {
                video_id: video_id.to_string(),
                language_code: code.clone(),
                language: language.to_string(),
                is_generated,
                url: url.to_string(),
            })
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct Json3 {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Debug, Deserialize)]
struct Json3Event {
    #[serde(default)]
    segs: Vec<Json3Segment>,
}

#[derive(Debug, Deserialize)]
struct Json3Segment {
    #[serde(default)]
    utf8: String,
}

/// One line per caption event.
fn parse_json3(body: &str) -> std::result::Result<Vec<String>, SourceError> {
    let captions: Json3 = serde_json::from_str(body)
        .map_err(|e| SourceError::Failed(format!("Invalid caption data: {}", e)))?;

    Ok(captions
        .events
        .into_iter()
        .map(|event| {
            event
                .segs
                .iter()
                .map(|s| s.utf8.as_str())
                .collect::<String>()
                .replace('\n', " ")
        })
        .filter(|line| !line.trim().is_empty())
        .collect())
}

#[async_trait]
impl TranscriptSource for YtDlpSource {
    async fn list_tracks(&self, video_id: &str) -> std::result::Result<Vec<Track>, SourceError> {
        let output = self
            .run_ytdlp(video_id)
            .await
            .map_err(|e| SourceError::Failed(e.to_string()))?;

        if !output.status.success() {
            return Err(classify_failure(&String::from_utf8_lossy(&output.stderr)));
        }

        let info: serde_json::Value = serde_json::from_slice(&output.stdout)
            .map_err(|e| SourceError::Failed(format!("Failed to parse yt-dlp output: {}", e)))?;

        let tracks = parse_tracks(video_id, &info);
        debug!("yt-dlp listed {} caption tracks for {}", tracks.len(), video_id);

        if tracks.is_empty() {
            return Err(SourceError::TranscriptsDisabled);
        }
        Ok(tracks)
    }

    async fn fetch_track(&self, track: &Track) -> std::result::Result<Vec<String>, SourceError> {
        let response = self
            .http
            .get(&track.url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| SourceError::Failed(format!("Caption download failed: {}", e)))?;

        let body = response
            .text()
            .await
            .map_err(|e| SourceError::Failed(format!("Caption download failed: {}", e)))?;

        parse_json3(&body)
    }
}

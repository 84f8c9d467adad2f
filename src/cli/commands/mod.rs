//! CLI command implementations.

mod ask;
mod chat;
mod config;
mod serve;
mod transcript;

pub use ask::run_ask;
pub use chat::run_chat;
pub use config::run_config;
pub use serve::run_serve;
pub use transcript::run_transcript;

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::error::VidqaError;
use crate::transcript::{extract_video_id, fetch_transcript, FetchStatus, YtDlpSource};
use anyhow::Result;
use std::path::Path;

/// Resolve a command input to transcript text.
///
/// An existing file is read as a plain-text transcript; anything else must
/// be a YouTube URL or video ID.
pub(crate) async fn load_input(input: &str, lang: &str, settings: &Settings) -> Result<String> {
    let path = Settings::expand_path(input);
    if path.is_file() {
        return read_transcript_file(&path);
    }

    if extract_video_id(input).is_none() {
        return Err(VidqaError::InvalidInput(format!(
            "{} is neither a transcript file nor a YouTube URL",
            input
        ))
        .into());
    }

    if let Err(e) = preflight::check(Operation::FetchTranscript, settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let source = YtDlpSource::new(&settings.transcript)?;
    let spinner = Output::spinner("Fetching transcript...");
    let fetch = fetch_transcript(&source, input, lang).await;
    spinner.finish_and_clear();

    match &fetch.status {
        FetchStatus::Success { fallback: false, .. } => Output::success(&fetch.status.message()),
        FetchStatus::Success { fallback: true, .. } => Output::warning(&fetch.status.message()),
        status => Output::error(&status.message()),
    }

    Ok(fetch.into_text()?)
}

fn read_transcript_file(path: &Path) -> Result<String> {
    let text = std::fs::read_to_string(path)?;
    Output::info(&format!(
        "Read {} characters from {}",
        text.chars().count(),
        path.display()
    ));
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_load_input_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "The cat sat on the mat.").unwrap();

        let text = load_input(file.path().to_str().unwrap(), "en", &Settings::default())
            .await
            .unwrap();
        assert_eq!(text, "The cat sat on the mat.");
    }

    #[tokio::test]
    async fn test_load_input_rejects_garbage() {
        let err = load_input("/no/such/file.txt", "en", &Settings::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("neither a transcript file nor a YouTube URL"));
    }
}

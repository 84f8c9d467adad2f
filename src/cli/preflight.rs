//! Pre-flight checks before expensive operations.
//!
//! Validates that required tools and configuration are available
//! before starting operations that would otherwise fail midway.

use crate::config::Settings;
use crate::error::{Result, VidqaError};
use std::process::Command;
use url::Url;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Fetching a YouTube transcript requires yt-dlp.
    FetchTranscript,
    /// Answering questions requires usable service and chunking settings.
    Answer,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::FetchTranscript => {
            check_tool(&settings.transcript.ytdlp_path)?;
        }
        Operation::Answer => {
            check_api_base("llm.api_base", &settings.llm.api_base)?;
            check_api_base("embedding.api_base", &settings.embedding.api_base)?;
            settings.chunking_config()?;
        }
    }
    Ok(())
}

/// Check that a service endpoint is an http(s) URL.
fn check_api_base(key: &str, value: &str) -> Result<()> {
    let url = Url::parse(value)
        .map_err(|e| VidqaError::Config(format!("{} is not a valid URL ({}): {}", key, value, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(VidqaError::Config(format!(
            "{} must use http or https, not {}",
            key, other
        ))),
    }
}

/// Check if an external tool is available.
fn check_tool(name: &str) -> Result<()> {
    match Command::new(name).arg("--version").output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(VidqaError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(VidqaError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(VidqaError::ToolNotFound(format!("{}: {}", name, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_tool_not_found() {
        let result = check_tool("nonexistent_tool_xyz_123");
        assert!(matches!(result, Err(VidqaError::ToolNotFound(_))));
    }

    #[test]
    fn test_default_settings_pass_answer_checks() {
        assert!(check(Operation::Answer, &Settings::default()).is_ok());
    }

    #[test]
    fn test_bad_api_base_rejected() {
        let mut settings = Settings::default();
        settings.llm.api_base = "localhost:11434".to_string();
        assert!(matches!(
            check(Operation::Answer, &settings),
            Err(VidqaError::Config(_))
        ));

        settings.llm.api_base = "not a url".to_string();
        assert!(check(Operation::Answer, &settings).is_err());
    }

    #[test]
    fn test_missing_ytdlp_reported() {
        let mut settings = Settings::default();
        settings.transcript.ytdlp_path = "nonexistent_tool_xyz_123".to_string();
        assert!(matches!(
            check(Operation::FetchTranscript, &settings),
            Err(VidqaError::ToolNotFound(_))
        ));
    }
}

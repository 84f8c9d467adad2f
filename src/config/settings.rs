//! Configuration settings for vidqa.

use crate::chunking::ChunkingConfig;
use crate::error::{Result, VidqaError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default endpoint for a local Ollama server's OpenAI-compatible API.
pub const DEFAULT_API_BASE: &str = "http://localhost:11434/v1";

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub llm: LlmSettings,
    pub embedding: EmbeddingSettings,
    pub chunking: ChunkingSettings,
    pub retrieval: RetrievalSettings,
    pub rag: RagSettings,
    pub transcript: TranscriptSettings,
    pub server: ServerSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
        }
    }
}

/// Language model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Base URL of the OpenAI-compatible API.
    pub api_base: String,
    /// Model identifier.
    pub model: String,
    /// Generation randomness.
    pub temperature: f32,
    /// Per-call timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            model: "mistral".to_string(),
            temperature: 0.5,
            timeout_seconds: 120,
        }
    }
}

impl LlmSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Base URL of the OpenAI-compatible API.
    pub api_base: String,
    /// Embedding model to use.
    pub model: String,
    /// Texts per embedding request.
    pub batch_size: usize,
    /// Maximum embedding requests in flight.
    pub max_concurrent: usize,
    /// Per-call timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            model: "nomic-embed-text".to_string(),
            batch_size: 32,
            max_concurrent: 2,
            timeout_seconds: 60,
        }
    }
}

impl EmbeddingSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Transcript chunking settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    /// Maximum segment length in characters.
    pub chunk_size: usize,
    /// Characters shared between consecutive segments.
    pub chunk_overlap: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            chunk_size: 1500,
            chunk_overlap: 200,
        }
    }
}

impl ChunkingSettings {
    /// Check the options, rejecting rather than clamping invalid values.
    pub fn validate(&self) -> Result<ChunkingConfig> {
        ChunkingConfig::new(self.chunk_size, self.chunk_overlap)
    }
}

/// Retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Number of segments retrieved per question.
    pub k: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self { k: 2 }
    }
}

/// Answer generation settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RagSettings {
    /// Warn when an answer shares less than this fraction of its words with
    /// the retrieved context. 0.0 disables the warning.
    pub min_grounding_overlap: f32,
}

/// Transcript fetching settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptSettings {
    /// Preferred caption language code.
    pub language: String,
    /// yt-dlp executable.
    pub ytdlp_path: String,
    /// Timeout in seconds for listing and downloading captions.
    pub timeout_seconds: u64,
}

impl Default for TranscriptSettings {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            ytdlp_path: "yt-dlp".to_string(),
            timeout_seconds: 60,
        }
    }
}

impl TranscriptSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Sessions unused for this many seconds are dropped. 0 keeps them forever.
    pub session_idle_seconds: u64,
    /// Upper bound on live sessions.
    pub max_sessions: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8010,
            session_idle_seconds: 3600,
            max_sessions: 1000,
        }
    }
}

impl ServerSettings {
    /// Idle limit for sessions, if any.
    pub fn session_idle_limit(&self) -> Option<Duration> {
        (self.session_idle_seconds > 0).then(|| Duration::from_secs(self.session_idle_seconds))
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| VidqaError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("vidqa")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Validated chunking parameters.
    pub fn chunking_config(&self) -> Result<ChunkingConfig> {
        self.chunking.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.llm.model, "mistral");
        assert!((settings.llm.temperature - 0.5).abs() < f32::EPSILON);
        assert_eq!(settings.chunking.chunk_size, 1500);
        assert_eq!(settings.chunking.chunk_overlap, 200);
        assert_eq!(settings.retrieval.k, 2);
        assert_eq!(settings.embedding.model, "nomic-embed-text");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [llm]
            model = "llama3"

            [retrieval]
            k = 4
            "#,
        )
        .unwrap();

        assert_eq!(settings.llm.model, "llama3");
        assert_eq!(settings.llm.api_base, DEFAULT_API_BASE);
        assert_eq!(settings.retrieval.k, 4);
        assert_eq!(settings.chunking.chunk_size, 1500);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut settings = Settings::default();
        settings.chunking.chunk_size = 800;
        settings.server.port = 9000;
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.chunking.chunk_size, 800);
        assert_eq!(loaded.server.port, 9000);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.retrieval.k, 2);
    }

    #[test]
    fn test_invalid_chunking_rejected() {
        let mut settings = Settings::default();
        settings.chunking.chunk_overlap = settings.chunking.chunk_size;
        let err = settings.chunking_config().unwrap_err();
        assert!(matches!(err, VidqaError::Config(_)));
    }

    #[test]
    fn test_chunk_options_from_file_are_validated() {
        let settings: Settings = toml::from_str(
            r#"
            [chunking]
            chunk_size = 100
            chunk_overlap = 150
            "#,
        )
        .unwrap();

        let err = settings.chunking_config().unwrap_err();
        assert!(err.to_string().contains("chunk_overlap (150) must be smaller than chunk_size (100)"));
    }
}

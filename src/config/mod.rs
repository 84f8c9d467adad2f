//! Configuration module for vidqa.
//!
//! Handles loading application settings and holds the fixed grounding prompt.

mod prompts;
mod settings;

pub use prompts::{render, render_grounding_prompt, GROUNDING_TEMPLATE, NOT_DISCUSSED, NO_CONTEXT};
pub use settings::{
    ChunkingSettings, EmbeddingSettings, GeneralSettings, LlmSettings, RagSettings,
    RetrievalSettings, ServerSettings, Settings, TranscriptSettings, DEFAULT_API_BASE,
};

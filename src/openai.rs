//! OpenAI-compatible client configuration.
//!
//! Both the embedding and the chat backends speak the OpenAI wire format, which
//! Ollama also serves under `/v1`, so one client factory covers both.

use crate::error::{Result, VidqaError};
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Placeholder key sent when `OPENAI_API_KEY` is unset. Ollama ignores it.
const PLACEHOLDER_API_KEY: &str = "ollama";

/// Resolve the API key from the environment.
pub fn api_key() -> String {
    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if !key.is_empty() => key,
        _ => PLACEHOLDER_API_KEY.to_string(),
    }
}

/// Create a client for `api_base` whose HTTP requests give up after `timeout`.
pub fn create_client(api_base: &str, timeout: Duration) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| VidqaError::Config(format!("Failed to create HTTP client: {}", e)))?;

    let config = OpenAIConfig::new()
        .with_api_base(api_base.trim_end_matches('/'))
        .with_api_key(api_key());

    Ok(Client::with_config(config).with_http_client(http_client))
}

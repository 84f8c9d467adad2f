//! Embeddings over an OpenAI-compatible API (Ollama by default).

use super::{validate_embeddings, Embedder, EmbeddingVector};
use crate::config::EmbeddingSettings;
use crate::error::{Result, VidqaError};
use crate::openai::create_client;
use async_openai::types::{CreateEmbeddingRequestArgs, EmbeddingInput};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use tracing::{debug, instrument};

/// Embedder backed by an OpenAI-compatible `/embeddings` endpoint.
pub struct OpenAIEmbedder {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    batch_size: usize,
    max_concurrent: usize,
}

impl OpenAIEmbedder {
    /// Create an embedder from settings.
    pub fn new(settings: &EmbeddingSettings) -> Result<Self> {
        Ok(Self {
            client: create_client(&settings.api_base, settings.timeout())?,
            model: settings.model.clone(),
            batch_size: settings.batch_size.max(1),
            max_concurrent: settings.max_concurrent.max(1),
        })
    }

    async fn embed_request(&self, input: Vec<String>) -> Result<Vec<EmbeddingVector>> {
        let expected = input.len();

        let request = CreateEmbeddingRequestArgs::default()
            .model(&self.model)
            .input(EmbeddingInput::StringArray(input))
            .build()
            .map_err(|e| VidqaError::Embedding(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .embeddings()
            .create(request)
            .await
            .map_err(|e| VidqaError::Embedding(format!("Embedding API error: {}", e)))?;

        // Sort by index to ensure correct order
        let mut data = response.data;
        data.sort_by_key(|e| e.index);
        let vectors: Vec<EmbeddingVector> = data.into_iter().map(|e| e.embedding).collect();

        validate_embeddings(expected, &vectors)?;
        Ok(vectors)
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    #[instrument(skip(self, text))]
    async fn embed(&self, text: &str) -> Result<EmbeddingVector> {
        let embeddings = self.embed_batch(&[text.to_string()]).await?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| VidqaError::Embedding("Empty embedding response".to_string()))
    }

    #[instrument(skip(self, texts), fields(count = texts.len()))]
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<EmbeddingVector>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Generating embeddings for {} texts", texts.len());

        let requests: Vec<_> = texts
            .chunks(self.batch_size)
            .map(|batch| self.embed_request(batch.to_vec()))
            .collect();

        // `buffered` yields batches in submission order.
        let batches: Vec<Result<Vec<EmbeddingVector>>> = stream::iter(requests)
            .buffered(self.max_concurrent)
            .collect()
            .await;

        let mut all_embeddings = Vec::with_capacity(texts.len());
        for batch in batches {
            all_embeddings.extend(batch?);
        }

        validate_embeddings(texts.len(), &all_embeddings)?;
        debug!("Generated {} embeddings", all_embeddings.len());
        Ok(all_embeddings)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

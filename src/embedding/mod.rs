//! Embedding generation for segments and questions.

mod openai;

pub use openai::OpenAIEmbedder;

use crate::error::{Result, VidqaError};
use async_trait::async_trait;

/// A fixed-length vector representation of a text.
pub type EmbeddingVector = Vec<f32>;

/// Trait for embedding generation.
///
/// Implementations must be deterministic for a fixed model and must report
/// failures as errors, never as placeholder vectors.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> Result<EmbeddingVector>;

    /// Generate embeddings for multiple texts, in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<EmbeddingVector>>;

    /// Identifier of the underlying model.
    fn model_name(&self) -> &str;
}

/// Check that a backend returned one non-empty, finite vector per input.
pub(crate) fn validate_embeddings(expected: usize, vectors: &[EmbeddingVector]) -> Result<()> {
    if vectors.len() != expected {
        return Err(VidqaError::Embedding(format!(
            "expected {} embeddings, got {}",
            expected,
            vectors.len()
        )));
    }
    if let Some(i) = vectors.iter().position(|v| v.is_empty()) {
        return Err(VidqaError::Embedding(format!(
            "embedding {} is empty",
            i
        )));
    }
    if let Some(i) = vectors
        .iter()
        .position(|v| v.iter().any(|x| !x.is_finite()))
    {
        return Err(VidqaError::Embedding(format!(
            "embedding {} has non-finite components",
            i
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::KeywordEmbedder;

    #[test]
    fn test_validate_embeddings() {
        assert!(validate_embeddings(2, &[vec![1.0], vec![0.5]]).is_ok());
        assert!(validate_embeddings(3, &[vec![1.0], vec![0.5]]).is_err());
        assert!(validate_embeddings(2, &[vec![1.0], vec![]]).is_err());
    }

    #[test]
    fn test_validate_rejects_non_finite() {
        let err = validate_embeddings(2, &[vec![1.0, 0.0], vec![f32::INFINITY, 1.0]]).unwrap_err();
        assert!(matches!(err, VidqaError::Embedding(_)));
        assert!(err.to_string().contains("embedding 1 has non-finite components"));

        assert!(validate_embeddings(1, &[vec![f32::NAN]]).is_err());
    }

    #[tokio::test]
    async fn test_embed_is_deterministic() {
        let embedder = KeywordEmbedder::new();
        let first = embedder.embed("The cat sat on the mat.").await.unwrap();
        let second = embedder.embed("The cat sat on the mat.").await.unwrap();
        assert_eq!(first, second);

        let other = embedder.embed("The dog ran in the park.").await.unwrap();
        assert_ne!(first, other);
    }

    #[tokio::test]
    async fn test_embed_batch_preserves_order() {
        let embedder = KeywordEmbedder::new();
        let texts = vec!["alpha".to_string(), "beta".to_string(), "alpha".to_string()];
        let vectors = embedder.embed_batch(&texts).await.unwrap();

        assert_eq!(vectors.len(), 3);
        assert_eq!(vectors[0], vectors[2]);
        assert_eq!(vectors[1], embedder.embed("beta").await.unwrap());
    }
}

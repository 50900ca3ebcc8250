//! Embedding provider trait for generating text embeddings

use async_trait::async_trait;
use crate::error::Result;

/// Trait for generating text embeddings
///
/// Implementations must return vectors of one fixed length, and identical
/// input must produce identical output.
///
/// Implementations:
/// - `OllamaEmbedder`: Local Ollama server (all-minilm, nomic-embed-text)
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate embedding for a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts (batch)
    ///
    /// Default implementation calls `embed` sequentially.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text).await?);
        }
        Ok(embeddings)
    }

    /// Check if the provider is healthy and available
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::KeywordEmbedder;
    use std::sync::atomic::Ordering;

    #[test]
    fn test_default_batch_preserves_order() {
        let embedder = KeywordEmbedder::default();
        let texts = vec!["alpha beta".to_string(), "gamma".to_string()];

        let batch = tokio_test::block_on(embedder.embed_batch(&texts)).unwrap();
        let first = tokio_test::block_on(embedder.embed("alpha beta")).unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0], first);
        assert_ne!(batch[0], batch[1]);
    }

    #[test]
    fn test_default_batch_stops_on_first_error() {
        let embedder = KeywordEmbedder::default();
        embedder.fail.store(true, Ordering::SeqCst);
        let texts = vec!["a".to_string(), "b".to_string()];

        let result = tokio_test::block_on(embedder.embed_batch(&texts));

        assert!(result.is_err());
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 1);
    }
}

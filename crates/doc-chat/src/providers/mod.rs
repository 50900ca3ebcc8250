//! Provider abstractions for embeddings and completion
//!
//! Trait objects let the server switch between a local Ollama backend and a
//! hosted OpenAI-compatible API (Groq) without touching the chat pipeline.

pub mod embedding;
pub mod llm;
pub mod ollama;
pub mod openai_compat;

use std::sync::Arc;

use crate::config::{DocChatConfig, LlmBackend};
use crate::error::Result;

pub use embedding::EmbeddingProvider;
pub use llm::LlmProvider;
pub use ollama::{OllamaEmbedder, OllamaLlm};
pub use openai_compat::OpenAiCompatLlm;

/// Construct the embedding and LLM providers selected by `config`
pub fn build_providers(
    config: &DocChatConfig,
) -> Result<(Arc<dyn EmbeddingProvider>, Arc<dyn LlmProvider>)> {
    let embedder: Arc<dyn EmbeddingProvider> = Arc::new(OllamaEmbedder::new(&config.embeddings)?);

    let llm: Arc<dyn LlmProvider> = match config.llm.provider {
        LlmBackend::Ollama => {
            tracing::info!("Using Ollama LLM ({})", config.llm.resolved_model());
            Arc::new(OllamaLlm::new(&config.llm)?)
        }
        LlmBackend::Groq => {
            tracing::info!(
                "Using hosted LLM ({}) at {}",
                config.llm.resolved_model(),
                config.llm.resolved_base_url()
            );
            Arc::new(OpenAiCompatLlm::new(&config.llm)?)
        }
    };

    Ok((embedder, llm))
}

//! LLM provider trait for text completion

use async_trait::async_trait;
use crate::error::Result;

/// Trait for prompt completion
///
/// Transient and permanent failures are both reported as `Error::Llm`.
///
/// Implementations:
/// - `OllamaLlm`: Local Ollama server
/// - `OpenAiCompatLlm`: Groq or any OpenAI-compatible chat completions API
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Complete `prompt` at the given sampling temperature
    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String>;

    /// Check if the provider is healthy and available
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}

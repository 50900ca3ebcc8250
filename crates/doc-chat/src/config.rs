//! Configuration for the document chat service

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Main service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DocChatConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Chunking configuration
    pub chunking: ChunkingConfig,
    /// Text extraction configuration
    pub ingestion: IngestionConfig,
    /// Retrieval configuration
    pub retrieval: RetrievalConfig,
    /// Embedding service configuration
    pub embeddings: EmbeddingConfig,
    /// Language model configuration
    pub llm: LlmConfig,
    /// Conversation history configuration
    pub sessions: SessionConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum upload size in bytes (default: 50MB)
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            enable_cors: true,
            max_upload_size: 50 * 1024 * 1024,
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Target chunk size in characters
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in characters
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1750,
            chunk_overlap: 350,
        }
    }
}

/// Text extraction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestionConfig {
    /// Upper bound for PDF text extraction in seconds
    pub extract_timeout_secs: u64,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            extract_timeout_secs: 60,
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of chunks used as answer context
    pub top_k: usize,
    /// Search with the raw question when query rewriting fails
    pub rewrite_fallback: bool,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            rewrite_fallback: false,
        }
    }
}

/// Embedding service configuration (Ollama)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Ollama base URL
    pub base_url: String,
    /// Embedding model name
    pub model: String,
    /// Embedding dimensions (384 for all-minilm, 768 for nomic-embed-text)
    pub dimensions: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "all-minilm".to_string(),
            dimensions: 384,
            timeout_secs: 60,
        }
    }
}

/// Which hosted or local model answers questions
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LlmBackend {
    /// Local Ollama server
    #[default]
    Ollama,
    /// Groq (OpenAI-compatible chat completions)
    Groq,
}

/// Language model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Backend provider
    pub provider: LlmBackend,
    /// Base URL; `None` uses the provider default
    pub base_url: Option<String>,
    /// Generation model name; `None` uses the provider default
    pub model: Option<String>,
    /// API key for hosted providers
    pub api_key: Option<String>,
    /// Temperature for answers
    pub answer_temperature: f32,
    /// Temperature for query rewriting
    pub rewrite_temperature: f32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries for failed requests
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmBackend::Ollama,
            base_url: None,
            model: None,
            api_key: None,
            answer_temperature: 0.1,
            rewrite_temperature: 0.0,
            timeout_secs: 120,
            max_retries: 0,
        }
    }
}

impl LlmConfig {
    /// Base URL with the provider default applied
    pub fn resolved_base_url(&self) -> String {
        match (&self.base_url, &self.provider) {
            (Some(url), _) => url.trim_end_matches('/').to_string(),
            (None, LlmBackend::Ollama) => "http://localhost:11434".to_string(),
            (None, LlmBackend::Groq) => "https://api.groq.com/openai/v1".to_string(),
        }
    }

    /// Model name with the provider default applied
    pub fn resolved_model(&self) -> String {
        match (&self.model, &self.provider) {
            (Some(model), _) => model.clone(),
            (None, LlmBackend::Ollama) => "llama3.2:3b".to_string(),
            (None, LlmBackend::Groq) => "llama-3.3-70b-versatile".to_string(),
        }
    }
}

/// Conversation history configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Keep at most this many turns per session (unbounded when unset)
    pub max_turns: Option<usize>,
}

impl DocChatConfig {
    /// Load configuration from an explicit path, `$DOC_CHAT_CONFIG`, or the
    /// user config directory, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os("DOC_CHAT_CONFIG").map(PathBuf::from))
            .or_else(|| {
                dirs::config_dir()
                    .map(|d| d.join("doc-chat").join("config.toml"))
                    .filter(|p| p.exists())
            });

        let mut config = match path {
            Some(path) => {
                tracing::info!("Loading configuration from {}", path.display());
                let raw = std::fs::read_to_string(&path).map_err(|e| {
                    Error::Config(format!("Failed to read {}: {}", path.display(), e))
                })?;
                Self::from_toml(&raw)?
            }
            None => Self::default(),
        };

        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document; missing fields take their defaults
    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::Config(format!("Invalid config: {}", e)))
    }

    fn apply_env(&mut self) {
        if let Ok(host) = std::env::var("DOC_CHAT_HOST") {
            self.server.host = host;
        }
        if let Some(port) = std::env::var("DOC_CHAT_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
        {
            self.server.port = port;
        }
        if self.llm.api_key.is_none() {
            self.llm.api_key = std::env::var("GROQ_API_KEY").ok().filter(|k| !k.is_empty());
        }
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_size == 0 {
            return Err(Error::Config("chunking.chunk_size must be positive".into()));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(Error::Config(format!(
                "chunking.chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if self.retrieval.top_k == 0 {
            return Err(Error::Config("retrieval.top_k must be positive".into()));
        }
        for (name, t) in [
            ("answer_temperature", self.llm.answer_temperature),
            ("rewrite_temperature", self.llm.rewrite_temperature),
        ] {
            if !(0.0..=2.0).contains(&t) {
                return Err(Error::Config(format!("llm.{} must be within [0, 2]", name)));
            }
        }
        if self.llm.provider == LlmBackend::Groq && self.llm.api_key.is_none() {
            return Err(Error::Config(
                "llm.provider = \"groq\" requires llm.api_key or GROQ_API_KEY".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = DocChatConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.chunking.chunk_size, 1750);
        assert_eq!(config.chunking.chunk_overlap, 350);
        assert_eq!(config.retrieval.top_k, 3);
        assert_eq!(config.llm.rewrite_temperature, 0.0);
    }

    #[test]
    fn test_partial_toml() {
        let config = DocChatConfig::from_toml(
            r#"
            [chunking]
            chunk_size = 500
            chunk_overlap = 50

            [llm]
            provider = "groq"
            api_key = "test"
            "#,
        )
        .unwrap();

        assert_eq!(config.chunking.chunk_size, 500);
        assert_eq!(config.retrieval.top_k, 3);
        assert_eq!(config.llm.provider, LlmBackend::Groq);
        assert_eq!(config.llm.resolved_base_url(), "https://api.groq.com/openai/v1");
        assert_eq!(config.llm.resolved_model(), "llama-3.3-70b-versatile");
        assert!(config.validate().is_ok());

        let local = DocChatConfig::from_toml("[llm]\nmodel = \"mistral\"\n").unwrap();
        assert_eq!(local.llm.resolved_model(), "mistral");
    }

    #[test]
    fn test_validate_rejects_bad_overlap() {
        let mut config = DocChatConfig::default();
        config.chunking.chunk_overlap = config.chunking.chunk_size;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = DocChatConfig::default();
        config.retrieval.top_k = 0;
        assert!(config.validate().is_err());

        let mut config = DocChatConfig::default();
        config.llm.answer_temperature = 3.0;
        assert!(config.validate().is_err());
    }
}

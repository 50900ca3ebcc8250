//! Model-service clients and prompt construction

pub mod ollama;
pub mod prompt;
pub mod retry;

pub use ollama::OllamaClient;
pub use prompt::PromptBuilder;
pub use retry::retry_request;

//! OpenAI-compatible chat completions client (Groq by default)

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::config::LlmConfig;
use crate::error::{Error, Result};
use crate::generation::retry_request;
use crate::providers::llm::LlmProvider;

/// Chat-completions client for hosted OpenAI-compatible APIs
pub struct OpenAiCompatLlm {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    max_retries: u32,
}

impl OpenAiCompatLlm {
    /// Create a new client; requires `config.api_key`
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| Error::Config("missing API key for hosted LLM".to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.resolved_base_url(),
            api_key,
            model: config.resolved_model(),
            max_retries: config.max_retries,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[derive(serde::Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
}

#[derive(serde::Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(serde::Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(serde::Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(serde::Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl LlmProvider for OpenAiCompatLlm {
    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String> {
        let url = self.endpoint();
        let client = &self.client;
        let (url, api_key, model) = (url.as_str(), self.api_key.as_str(), self.model.as_str());

        tracing::debug!("Requesting completion from {} ({})", model, url);

        retry_request(self.max_retries, || async move {
            let request = ChatCompletionRequest {
                model,
                messages: vec![Message {
                    role: "user",
                    content: prompt,
                }],
                temperature,
            };

            let response = client
                .post(url)
                .bearer_auth(api_key)
                .json(&request)
                .send()
                .await
                .map_err(|e| Error::llm(format!("Completion request failed: {}", e)))?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(Error::llm(format!(
                    "Completion failed: HTTP {} - {}",
                    status, body
                )));
            }

            let parsed: ChatCompletionResponse = response
                .json()
                .await
                .map_err(|e| Error::llm(format!("Failed to parse completion response: {}", e)))?;

            parsed
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .ok_or_else(|| Error::llm("Completion response contained no choices"))
        })
        .await
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/models", self.base_url);
        match self.client.get(&url).bearer_auth(&self.api_key).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn name(&self) -> &str {
        "openai-compatible"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LlmBackend;

    #[test]
    fn test_requires_api_key() {
        let config = LlmConfig {
            provider: LlmBackend::Groq,
            ..LlmConfig::default()
        };
        assert!(matches!(OpenAiCompatLlm::new(&config), Err(Error::Config(_))));
    }

    #[test]
    fn test_endpoint_uses_provider_default() {
        let config = LlmConfig {
            provider: LlmBackend::Groq,
            api_key: Some("key".to_string()),
            ..LlmConfig::default()
        };
        let llm = OpenAiCompatLlm::new(&config).unwrap();
        assert_eq!(llm.endpoint(), "https://api.groq.com/openai/v1/chat/completions");
        assert_eq!(llm.model(), "llama-3.3-70b-versatile");
    }

    #[test]
    fn test_response_parsing() {
        let raw = r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"5 years"}}]}"#;
        let parsed: ChatCompletionResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("5 years"));
    }
}

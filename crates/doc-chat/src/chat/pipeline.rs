//! History-aware retrieval chat: rewrite, retrieve, answer

use std::sync::Arc;
use std::time::Instant;

use crate::config::DocChatConfig;
use crate::error::Result;
use crate::generation::PromptBuilder;
use crate::providers::{EmbeddingProvider, LlmProvider};
use crate::retrieval::DocumentIndex;
use crate::types::{ChatRequest, Turn};

use super::session::SessionStore;

/// Tunables for one chat turn
#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub top_k: usize,
    pub answer_temperature: f32,
    pub rewrite_temperature: f32,
    pub rewrite_fallback: bool,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            top_k: 3,
            answer_temperature: 0.1,
            rewrite_temperature: 0.0,
            rewrite_fallback: false,
        }
    }
}

impl From<&DocChatConfig> for ChatSettings {
    fn from(config: &DocChatConfig) -> Self {
        Self {
            top_k: config.retrieval.top_k,
            answer_temperature: config.llm.answer_temperature,
            rewrite_temperature: config.llm.rewrite_temperature,
            rewrite_fallback: config.retrieval.rewrite_fallback,
        }
    }
}

/// Answers questions against an index, keeping per-session history
pub struct ChatPipeline {
    embedder: Arc<dyn EmbeddingProvider>,
    llm: Arc<dyn LlmProvider>,
    sessions: Arc<SessionStore>,
    settings: ChatSettings,
}

impl ChatPipeline {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmProvider>,
        sessions: Arc<SessionStore>,
        settings: ChatSettings,
    ) -> Self {
        Self {
            embedder,
            llm,
            sessions,
            settings,
        }
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// Turn a follow-up question into a self-contained search query
    pub async fn rewrite_query(&self, question: &str, history: &[Turn]) -> Result<String> {
        let prompt = PromptBuilder::build_rewrite_prompt(question, history);
        let output = self
            .llm
            .complete(&prompt, self.settings.rewrite_temperature)
            .await?;
        Ok(PromptBuilder::clean_rewrite(&output, question))
    }

    /// Run one chat turn against `index`
    ///
    /// History is only extended after the answer is produced; any failure
    /// leaves the session exactly as it was, and an exchange that straddles a
    /// reset is not recorded.
    pub async fn answer(&self, index: &DocumentIndex, request: &ChatRequest) -> Result<String> {
        let start = Instant::now();
        let epoch = self.sessions.epoch();
        let history = self.sessions.get_or_create(&request.session_id);

        let query = match self.rewrite_query(&request.message, &history).await {
            Ok(query) => query,
            Err(e) if self.settings.rewrite_fallback => {
                tracing::warn!("Query rewrite failed, using raw question: {}", e);
                request.message.clone()
            }
            Err(e) => return Err(e),
        };
        tracing::debug!("Search query for session {}: {}", request.session_id, query);

        let query_embedding = self.embedder.embed(&query).await?;
        let results = index.search(&query_embedding, self.settings.top_k)?;
        let context = PromptBuilder::build_context(&results);

        let prompt = PromptBuilder::build_answer_prompt(&request.message, &history, &context);
        let reply = self
            .llm
            .complete(&prompt, self.settings.answer_temperature)
            .await?
            .trim()
            .to_string();

        let recorded = self.sessions.append_exchange_since(
            epoch,
            &request.session_id,
            &request.message,
            &reply,
        );
        if !recorded {
            tracing::info!(
                "Sessions were reset while answering {}; exchange not recorded",
                request.session_id
            );
        }

        tracing::info!(
            "Answered session {} from {} chunks in {}ms",
            request.session_id,
            results.len(),
            start.elapsed().as_millis()
        );

        Ok(reply)
    }
}

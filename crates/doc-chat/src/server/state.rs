//! Application state for the chat server

use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::chat::{ChatPipeline, ChatSettings, SessionStore};
use crate::config::DocChatConfig;
use crate::error::{Error, Result};
use crate::ingestion::IngestPipeline;
use crate::providers::{self, EmbeddingProvider, LlmProvider};
use crate::retrieval::DocumentIndex;
use crate::types::{ChatRequest, Chunk, Document};

/// Reply sent when a question arrives before any document is indexed
pub const NO_DOCUMENT_REPLY: &str = "Please upload a document first.";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: DocChatConfig,
    /// Parse + chunk pipeline
    ingest: IngestPipeline,
    /// Embedding provider (used for chunks and queries)
    embedder: Arc<dyn EmbeddingProvider>,
    /// LLM provider (Ollama or Groq)
    llm: Arc<dyn LlmProvider>,
    /// Rewrite, retrieve, answer
    chat: ChatPipeline,
    /// Conversation history per session
    sessions: Arc<SessionStore>,
    /// Index over the current document, if any
    index: RwLock<Option<Arc<DocumentIndex>>>,
    /// Serializes ingestion and reset
    ingest_lock: Mutex<()>,
}

impl AppState {
    /// Create new application state from configuration
    pub fn new(config: DocChatConfig) -> Result<Self> {
        tracing::info!("Initializing application state (llm: {:?})...", config.llm.provider);
        let (embedder, llm) = providers::build_providers(&config)?;
        Self::with_providers(config, embedder, llm)
    }

    /// Create state around explicit providers
    pub fn with_providers(
        config: DocChatConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmProvider>,
    ) -> Result<Self> {
        let ingest = IngestPipeline::from_config(&config)?;
        let sessions = Arc::new(SessionStore::with_max_turns(config.sessions.max_turns));
        let chat = ChatPipeline::new(
            Arc::clone(&embedder),
            Arc::clone(&llm),
            Arc::clone(&sessions),
            ChatSettings::from(&config),
        );

        tracing::info!(
            "Providers ready (embeddings: {}, llm: {} / {})",
            embedder.name(),
            llm.name(),
            llm.model()
        );

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                ingest,
                embedder,
                llm,
                chat,
                sessions,
                index: RwLock::new(None),
                ingest_lock: Mutex::new(()),
            }),
        })
    }

    /// Get configuration
    pub fn config(&self) -> &DocChatConfig {
        &self.inner.config
    }

    /// Get embedding provider
    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.inner.embedder
    }

    /// Get LLM provider
    pub fn llm(&self) -> &Arc<dyn LlmProvider> {
        &self.inner.llm
    }

    /// Get session store
    pub fn sessions(&self) -> &SessionStore {
        &self.inner.sessions
    }

    /// Snapshot of the current index
    pub fn current_index(&self) -> Option<Arc<DocumentIndex>> {
        self.inner.index.read().clone()
    }

    /// Install a new index, returning the one it replaced
    pub fn replace_index(&self, index: DocumentIndex) -> Option<Arc<DocumentIndex>> {
        self.inner.index.write().replace(Arc::new(index))
    }

    /// Parse, chunk, embed and index a file, then swap it in
    ///
    /// The previous index stays live until the new one is fully built.
    pub async fn ingest_file(&self, filename: &str, path: &Path) -> Result<Document> {
        let pipeline = self.inner.ingest.clone();
        let name = filename.to_string();
        let owned_path: PathBuf = path.to_path_buf();
        self.ingest_with(filename, move || pipeline.ingest(&name, &owned_path))
            .await
    }

    /// Same as [`AppState::ingest_file`] for an upload already held in memory
    pub async fn ingest_bytes(&self, filename: &str, bytes: Vec<u8>) -> Result<Document> {
        let pipeline = self.inner.ingest.clone();
        let name = filename.to_string();
        self.ingest_with(filename, move || pipeline.ingest_bytes(&name, &bytes))
            .await
    }

    async fn ingest_with<F>(&self, filename: &str, parse: F) -> Result<Document>
    where
        F: FnOnce() -> Result<(Document, Vec<Chunk>)> + Send + 'static,
    {
        let _guard = self.inner.ingest_lock.lock().await;
        let start = Instant::now();

        let (document, chunks) = self.parse_blocking(filename, parse).await?;

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        tracing::info!(
            "Embedding {} chunks from '{}' with {}",
            texts.len(),
            filename,
            self.inner.embedder.name()
        );
        let vectors = self.inner.embedder.embed_batch(&texts).await?;

        let index = DocumentIndex::build(document, chunks, vectors)?;
        if index.dimensions() != self.inner.config.embeddings.dimensions {
            tracing::warn!(
                "Embedding model returned {} dimensions, config expects {}",
                index.dimensions(),
                self.inner.config.embeddings.dimensions
            );
        }
        let document = index.document().clone();
        let previous = self.replace_index(index);

        if let Some(previous) = previous {
            tracing::info!("Replaced document '{}'", previous.document().filename);
        }
        tracing::info!(
            "Indexed '{}' ({} chunks) in {:.1}s",
            document.filename,
            document.total_chunks,
            start.elapsed().as_secs_f64()
        );

        Ok(document)
    }

    async fn parse_blocking<F>(&self, filename: &str, parse: F) -> Result<(Document, Vec<Chunk>)>
    where
        F: FnOnce() -> Result<(Document, Vec<Chunk>)> + Send + 'static,
    {
        // Outer guard in case the blocking task outlives the extractor's own timeout
        let limit = Duration::from_secs(self.inner.config.ingestion.extract_timeout_secs + 5);

        let task = tokio::task::spawn_blocking(parse);
        match tokio::time::timeout(limit, task).await {
            Ok(joined) => joined.map_err(|e| Error::Internal(format!("Task join error: {}", e)))?,
            Err(_) => Err(Error::extraction(
                filename,
                format!("text extraction exceeded {}s", limit.as_secs()),
            )),
        }
    }

    /// Answer a chat message, or the placeholder when nothing is indexed
    ///
    /// The placeholder wins over message validation.
    pub async fn chat(&self, request: &ChatRequest) -> Result<String> {
        let Some(index) = self.current_index() else {
            return Ok(NO_DOCUMENT_REPLY.to_string());
        };
        if request.message.trim().is_empty() {
            return Err(Error::BadRequest("message must not be empty".to_string()));
        }
        self.inner.chat.answer(&index, request).await
    }

    /// Drop the index and every session
    pub async fn reset(&self) {
        let _guard = self.inner.ingest_lock.lock().await;
        let dropped = self.inner.index.write().take();
        self.inner.sessions.clear_all();
        match dropped {
            Some(index) => tracing::info!(
                "Cleared index for '{}' and all sessions",
                index.document().filename
            ),
            None => tracing::info!("Reset requested with no document loaded"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::LlmProvider;
    use crate::test_support::{write_pdf, KeywordEmbedder, ScriptedLlm};
    use async_trait::async_trait;
    use std::sync::atomic::Ordering;
    use tempfile::TempDir;
    use tokio::sync::Notify;

    /// Holds every answer call until released
    #[derive(Default)]
    struct GatedLlm {
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl LlmProvider for GatedLlm {
        async fn complete(&self, prompt: &str, _temperature: f32) -> Result<String> {
            if prompt.trim_end().ends_with("Standalone Search Query:") {
                return Ok("Python experience".to_string());
            }
            self.entered.notify_one();
            self.release.notified().await;
            Ok("Five years, according to the old document.".to_string())
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "gated"
        }

        fn model(&self) -> &str {
            "gated"
        }
    }

    fn request(message: &str, session_id: &str) -> ChatRequest {
        ChatRequest {
            message: message.to_string(),
            session_id: session_id.to_string(),
        }
    }

    fn state(embedder: Arc<KeywordEmbedder>, llm: Arc<ScriptedLlm>) -> AppState {
        AppState::with_providers(DocChatConfig::default(), embedder, llm).unwrap()
    }

    #[tokio::test]
    async fn test_placeholder_without_model_calls() {
        let embedder = Arc::new(KeywordEmbedder::default());
        let llm = Arc::new(ScriptedLlm::default());
        let state = state(embedder.clone(), llm.clone());

        let reply = state
            .chat(&ChatRequest {
                message: "Hello?".into(),
                session_id: "s1".into(),
            })
            .await
            .unwrap();

        assert_eq!(reply, NO_DOCUMENT_REPLY);
        assert_eq!(llm.call_count(), 0);
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
        assert_eq!(state.sessions().turn_count("s1"), 0);
    }

    #[tokio::test]
    async fn test_ingest_replaces_and_reset_clears() {
        let dir = TempDir::new().unwrap();
        let first = dir.path().join("first.pdf");
        let second = dir.path().join("second.pdf");
        write_pdf(&first, &["The candidate has 5 years of Python experience."]);
        write_pdf(&second, &["The warranty covers parts for 24 months."]);

        let state = state(Arc::new(KeywordEmbedder::default()), Arc::new(ScriptedLlm::default()));

        state.ingest_file("first.pdf", &first).await.unwrap();
        let doc = state.ingest_file("second.pdf", &second).await.unwrap();
        assert_eq!(doc.filename, "second.pdf");
        assert_eq!(state.current_index().unwrap().document().filename, "second.pdf");

        state.sessions().append_exchange("s1", "q", "a");
        state.reset().await;
        assert!(state.current_index().is_none());
        assert!(state.sessions().is_empty());

        // idempotent
        state.reset().await;
        assert!(state.current_index().is_none());
    }

    #[tokio::test]
    async fn test_failed_ingest_keeps_previous_index() {
        let dir = TempDir::new().unwrap();
        let good = dir.path().join("good.pdf");
        write_pdf(&good, &["The candidate has 5 years of Python experience."]);
        let bogus = dir.path().join("bogus.pdf");
        std::fs::write(&bogus, b"not a pdf at all").unwrap();

        let embedder = Arc::new(KeywordEmbedder::default());
        let state = state(embedder.clone(), Arc::new(ScriptedLlm::default()));
        let original = state.ingest_file("good.pdf", &good).await.unwrap();

        let err = state.ingest_file("bogus.pdf", &bogus).await.unwrap_err();
        assert!(matches!(err, Error::Extraction { .. }));
        assert_eq!(state.current_index().unwrap().document().id, original.id);

        embedder.fail.store(true, Ordering::SeqCst);
        let err = state.ingest_file("good.pdf", &good).await.unwrap_err();
        assert!(err.is_model_call());
        assert_eq!(state.current_index().unwrap().document().id, original.id);
    }

    #[tokio::test]
    async fn test_ingest_bytes_installs_index() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("resume.pdf");
        write_pdf(&path, &["The candidate has 5 years of Python experience."]);
        let bytes = std::fs::read(&path).unwrap();

        let llm = Arc::new(ScriptedLlm::default());
        let state = state(Arc::new(KeywordEmbedder::default()), llm);

        let doc = state.ingest_bytes("resume.pdf", bytes).await.unwrap();
        assert_eq!(doc.filename, "resume.pdf");
        assert_eq!(doc.total_pages, 1);
        assert_eq!(state.current_index().unwrap().document().id, doc.id);

        let reply = state
            .chat(&request("How many years of Python?", "s1"))
            .await
            .unwrap();
        assert!(reply.contains("5 years of Python"));

        let err = state
            .ingest_bytes("notes.pdf", b"plain text".to_vec())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Extraction { .. }));
        assert_eq!(state.current_index().unwrap().document().id, doc.id);
    }

    #[tokio::test]
    async fn test_empty_message_checked_after_placeholder() {
        let llm = Arc::new(ScriptedLlm::default());
        let state = state(Arc::new(KeywordEmbedder::default()), llm.clone());

        let reply = state.chat(&request("   ", "s1")).await.unwrap();
        assert_eq!(reply, NO_DOCUMENT_REPLY);

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("resume.pdf");
        write_pdf(&path, &["The candidate has 5 years of Python experience."]);
        state.ingest_file("resume.pdf", &path).await.unwrap();

        let err = state.chat(&request("  ", "s1")).await.unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));
        assert_eq!(llm.call_count(), 0);
        assert_eq!(state.sessions().turn_count("s1"), 0);
    }

    #[tokio::test]
    async fn test_reset_discards_in_flight_exchange() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("resume.pdf");
        write_pdf(&path, &["The candidate has 5 years of Python experience."]);

        let llm = Arc::new(GatedLlm::default());
        let state = AppState::with_providers(
            DocChatConfig::default(),
            Arc::new(KeywordEmbedder::default()),
            llm.clone(),
        )
        .unwrap();
        state.ingest_file("resume.pdf", &path).await.unwrap();

        let chatting = state.clone();
        let task = tokio::spawn(async move {
            chatting
                .chat(&request("How many years of Python?", "s1"))
                .await
        });

        llm.entered.notified().await;
        state.reset().await;
        llm.release.notify_one();

        let reply = task.await.unwrap().unwrap();
        assert_eq!(reply, "Five years, according to the old document.");
        assert!(state.current_index().is_none());
        assert_eq!(state.sessions().turn_count("s1"), 0);
        assert!(state.sessions().is_empty());
    }
}

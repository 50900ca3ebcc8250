//! Document chat server binary
//!
//! Run with: cargo run -p doc-chat --bin doc-chat-server [config.toml]

use doc_chat::{config::DocChatConfig, server::DocChatServer};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "doc_chat=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!(
        r#"
╔═══════════════════════════════════════════════════════════╗
║                         Doc Chat                          ║
║         Conversational Q&A over an uploaded PDF           ║
╚═══════════════════════════════════════════════════════════╝
"#
    );

    // Load configuration
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = DocChatConfig::load(config_path.as_deref())?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Embedding model: {}", config.embeddings.model);
    tracing::info!("  - LLM: {:?} / {}", config.llm.provider, config.llm.resolved_model());
    tracing::info!(
        "  - Chunking: {} chars, {} overlap",
        config.chunking.chunk_size,
        config.chunking.chunk_overlap
    );
    tracing::info!("  - Top-k: {}", config.retrieval.top_k);

    // Create server
    let server = DocChatServer::new(config)?;

    // Check model services
    let state = server.state();
    if matches!(state.embedder().health_check().await, Ok(true)) {
        tracing::info!("Embedding service is reachable ({})", state.embedder().name());
    } else {
        tracing::warn!("Embedding service not available");
        tracing::warn!("Please start Ollama:");
        tracing::warn!("  1. Start: ollama serve");
        tracing::warn!("  2. Pull model: ollama pull {}", state.config().embeddings.model);
    }
    if !matches!(state.llm().health_check().await, Ok(true)) {
        tracing::warn!(
            "LLM service not available ({} / {})",
            state.llm().name(),
            state.llm().model()
        );
    }

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("  API Info: http://{}/api/info", server.address());
    println!("\nEndpoints:");
    println!("  POST /upload - Upload a PDF");
    println!("  POST /chat   - Ask questions");
    println!("  POST /clear  - Reset document and history");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}

//! Routes for the chat server

pub mod chat;
pub mod document;
pub mod reset;
pub mod upload;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use crate::server::state::AppState;

/// Upload, chat and reset routes served at the root
pub fn chat_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        // Upload - with larger body limit for documents
        .route(
            "/upload",
            post(upload::upload_document).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route("/chat", post(chat::chat))
        .route("/clear", post(reset::clear))
}

/// Introspection routes nested under /api
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/document", get(document::current_document))
        .route("/info", get(info))
}

/// API info endpoint
async fn info() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "name": "doc-chat",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Chat with a single uploaded PDF using retrieval-augmented answers",
        "endpoints": {
            "POST /upload": "Upload a PDF (multipart field 'file'); replaces the current document",
            "POST /chat": "Ask a question: {\"message\", \"session_id\"}",
            "POST /clear": "Drop the document and all chat history",
            "GET /api/document": "Summary of the indexed document",
            "GET /health": "Liveness check"
        },
        "features": {
            "query_rewriting": "Follow-up questions are rewritten using session history",
            "grounded_answers": "LLM uses only document content, no external knowledge"
        }
    }))
}

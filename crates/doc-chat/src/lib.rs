//! doc-chat: conversational question answering over a single uploaded PDF
//!
//! Upload a document, ask questions about it, ask follow-ups. Each question is
//! rewritten against the session's history, the most similar chunks are
//! retrieved, and the language model answers from those chunks only.

pub mod chat;
pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::DocChatConfig;
pub use error::{Error, Result};
pub use types::{
    chat::{ChatRequest, ChatResponse, Role, Turn},
    document::{Chunk, Document, FileType},
    response::{DocumentSummary, StatusResponse},
};

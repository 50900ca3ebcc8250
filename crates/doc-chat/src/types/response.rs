//! Response types for upload, reset and document endpoints

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::document::Document;

/// Outcome of an upload or reset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    /// "success" or "error"
    pub status: String,
    /// Human-readable message
    pub message: String,
}

impl StatusResponse {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
        }
    }
}

/// Summary of the indexed document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub id: Uuid,
    pub filename: String,
    pub content_hash: String,
    pub total_pages: u32,
    pub total_chunks: u32,
    pub total_chars: usize,
    pub ingested_at: String,
}

impl From<&Document> for DocumentSummary {
    fn from(doc: &Document) -> Self {
        Self {
            id: doc.id,
            filename: doc.filename.clone(),
            content_hash: doc.content_hash.clone(),
            total_pages: doc.total_pages,
            total_chunks: doc.total_chunks,
            total_chars: doc.total_chars,
            ingested_at: doc.ingested_at.to_rfc3339(),
        }
    }
}

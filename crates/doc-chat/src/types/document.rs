//! Document and chunk types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Upload formats the extractor understands
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// PDF document
    Pdf,
    /// Anything else, with its lowercased extension
    Unsupported(String),
}

impl FileType {
    /// Detect file type from a filename's extension
    pub fn from_filename(filename: &str) -> Self {
        let extension = filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "pdf" => Self::Pdf,
            _ => Self::Unsupported(extension),
        }
    }

    /// Check if this is a supported file type
    pub fn is_supported(&self) -> bool {
        matches!(self, Self::Pdf)
    }

    /// Get display name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Pdf => "PDF",
            Self::Unsupported(ext) if ext.is_empty() => "file without extension",
            Self::Unsupported(ext) => ext,
        }
    }
}

/// The document currently backing the index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique document ID
    pub id: Uuid,
    /// Filename as uploaded by the user
    pub filename: String,
    /// SHA-256 of the extracted text
    pub content_hash: String,
    /// Total number of pages
    pub total_pages: u32,
    /// Total number of chunks created
    pub total_chunks: u32,
    /// Length of the extracted text in characters
    pub total_chars: usize,
    /// Ingestion timestamp
    pub ingested_at: chrono::DateTime<chrono::Utc>,
}

impl Document {
    /// Create a new document record
    pub fn new(
        filename: String,
        content_hash: String,
        total_pages: u32,
        total_chars: usize,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            filename,
            content_hash,
            total_pages,
            total_chunks: 0,
            total_chars,
            ingested_at: chrono::Utc::now(),
        }
    }
}

/// A contiguous span of extracted text
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Unique chunk ID
    pub id: Uuid,
    /// Position in document order (0-based)
    pub index: u32,
    /// Text content
    pub content: String,
}

impl Chunk {
    /// Create a new chunk
    pub fn new(index: u32, content: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            index,
            content,
        }
    }
}

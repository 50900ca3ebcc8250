//! Ingestion pipeline orchestration

use std::path::Path;
use std::time::Duration;

use crate::config::DocChatConfig;
use crate::error::{Error, Result};
use crate::types::{Chunk, Document};

use super::chunker::TextChunker;
use super::parser::{FileParser, ParsedDocument};

/// Parse + chunk for one uploaded file
#[derive(Debug, Clone)]
pub struct IngestPipeline {
    chunker: TextChunker,
    extract_timeout: Duration,
}

impl IngestPipeline {
    /// Create a new ingestion pipeline
    pub fn new(chunk_size: usize, chunk_overlap: usize, extract_timeout: Duration) -> Result<Self> {
        Ok(Self {
            chunker: TextChunker::new(chunk_size, chunk_overlap)?,
            extract_timeout,
        })
    }

    /// Build from service configuration
    pub fn from_config(config: &DocChatConfig) -> Result<Self> {
        Self::new(
            config.chunking.chunk_size,
            config.chunking.chunk_overlap,
            Duration::from_secs(config.ingestion.extract_timeout_secs),
        )
    }

    /// Parse a file
    pub fn parse_file(&self, filename: &str, path: &Path) -> Result<ParsedDocument> {
        FileParser::parse_path(filename, path, self.extract_timeout)
    }

    /// Create chunks from a parsed document
    pub fn create_chunks(&self, parsed: &ParsedDocument) -> Vec<Chunk> {
        self.chunker
            .chunk(&parsed.content)
            .into_iter()
            .enumerate()
            .map(|(i, content)| Chunk::new(i as u32, content))
            .collect()
    }

    /// Full ingestion of a file on disk: parse + chunk. Blocking.
    pub fn ingest(&self, filename: &str, path: &Path) -> Result<(Document, Vec<Chunk>)> {
        let parsed = self.parse_file(filename, path)?;
        self.finish(filename, parsed)
    }

    /// Full ingestion of an in-memory upload. Blocking.
    pub fn ingest_bytes(&self, filename: &str, bytes: &[u8]) -> Result<(Document, Vec<Chunk>)> {
        let parsed = FileParser::parse(filename, bytes, self.extract_timeout)?;
        self.finish(filename, parsed)
    }

    fn finish(&self, filename: &str, parsed: ParsedDocument) -> Result<(Document, Vec<Chunk>)> {
        let mut doc = Document::new(
            filename.to_string(),
            parsed.content_hash.clone(),
            parsed.total_pages,
            parsed.content.chars().count(),
        );

        let chunks = self.create_chunks(&parsed);
        if chunks.is_empty() {
            return Err(Error::extraction(filename, "document produced no text chunks"));
        }
        doc.total_chunks = chunks.len() as u32;

        tracing::info!(
            "Parsed '{}': {} pages, {} chars, {} chunks",
            filename,
            doc.total_pages,
            doc.total_chars,
            doc.total_chunks
        );

        Ok((doc, chunks))
    }
}

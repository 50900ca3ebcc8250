//! Document ingestion: PDF extraction and chunking

mod chunker;
mod parser;
mod processor;

pub use chunker::TextChunker;
pub use parser::{cleanup_pdf_text, hash_content, FileParser, ParsedDocument};
pub use processor::IngestPipeline;

//! Core types for the document chat service

pub mod chat;
pub mod document;
pub mod response;

pub use chat::{ChatRequest, ChatResponse, Role, Turn};
pub use document::{Chunk, Document, FileType};
pub use response::{DocumentSummary, StatusResponse};

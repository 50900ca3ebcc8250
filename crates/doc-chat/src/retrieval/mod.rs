//! Similarity retrieval over the indexed document

mod index;

pub use index::{DocumentIndex, SearchResult};

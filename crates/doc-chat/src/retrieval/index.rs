//! In-memory similarity index over one document's chunks

use std::cmp::Ordering;

use crate::error::{Error, Result};
use crate::types::{Chunk, Document};

/// Search result with chunk and similarity
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The retrieved chunk
    pub chunk: Chunk,
    /// Cosine similarity (-1.0 to 1.0, higher is better)
    pub similarity: f32,
}

struct IndexEntry {
    chunk: Chunk,
    vector: Vec<f32>,
    norm: f32,
}

/// Immutable (chunk, vector) index for a single document
///
/// Never mutated after `build`; replacing the document means building a new
/// index and swapping it in.
pub struct DocumentIndex {
    document: Document,
    entries: Vec<IndexEntry>,
    dimensions: usize,
}

impl DocumentIndex {
    /// Build an index from chunks and their embeddings (same order)
    pub fn build(document: Document, chunks: Vec<Chunk>, vectors: Vec<Vec<f32>>) -> Result<Self> {
        if chunks.is_empty() {
            return Err(Error::retrieval("cannot build an index without chunks"));
        }
        if chunks.len() != vectors.len() {
            return Err(Error::retrieval(format!(
                "{} chunks but {} embeddings",
                chunks.len(),
                vectors.len()
            )));
        }

        let dimensions = vectors[0].len();
        if dimensions == 0 {
            return Err(Error::retrieval("embeddings are empty"));
        }

        let entries = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| {
                if vector.len() != dimensions {
                    return Err(Error::retrieval(format!(
                        "chunk {} has {} dimensions, expected {}",
                        chunk.index,
                        vector.len(),
                        dimensions
                    )));
                }
                let norm = l2_norm(&vector);
                Ok(IndexEntry { chunk, vector, norm })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            document,
            entries,
            dimensions,
        })
    }

    /// Top-k chunks by decreasing cosine similarity; ties go to the earlier chunk
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        if query.len() != self.dimensions {
            return Err(Error::retrieval(format!(
                "query has {} dimensions, index has {}",
                query.len(),
                self.dimensions
            )));
        }

        let query_norm = l2_norm(query);
        let mut scored: Vec<(f32, &IndexEntry)> = self
            .entries
            .iter()
            .map(|entry| (cosine(query, query_norm, &entry.vector, entry.norm), entry))
            .collect();

        scored.sort_by(|(sa, ea), (sb, eb)| {
            sb.partial_cmp(sa)
                .unwrap_or(Ordering::Equal)
                .then_with(|| ea.chunk.index.cmp(&eb.chunk.index))
        });

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(similarity, entry)| SearchResult {
                chunk: entry.chunk.clone(),
                similarity,
            })
            .collect())
    }

    /// The document this index was built from
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Number of indexed chunks
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false for a built index
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Embedding dimensions
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }
}

fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

fn cosine(a: &[f32], norm_a: f32, b: &[f32], norm_b: f32) -> f32 {
    if norm_a < f32::EPSILON || norm_b < f32::EPSILON {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    dot / (norm_a * norm_b)
}

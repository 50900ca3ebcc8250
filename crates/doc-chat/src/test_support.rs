//! Test fixtures: PDF writer and in-process model doubles

use async_trait::async_trait;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Object, Stream};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::error::{Error, Result};
use crate::providers::{EmbeddingProvider, LlmProvider};

/// Write a minimal PDF with one text line per page
pub(crate) fn write_pdf(path: &Path, pages: &[&str]) {
    let mut doc = lopdf::Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![50.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}

const DIMS: usize = 128;

/// Deterministic bag-of-words embedder
///
/// Texts sharing words land close together, which is enough to make
/// retrieval assertions meaningful without a model server.
#[derive(Default)]
pub(crate) struct KeywordEmbedder {
    pub calls: AtomicUsize,
    pub fail: AtomicBool,
    /// Every text passed to `embed`, in call order
    pub texts: Mutex<Vec<String>>,
}

impl KeywordEmbedder {
    pub fn last_text(&self) -> Option<String> {
        self.texts.lock().last().cloned()
    }

    fn vectorize(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; DIMS];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            // FNV-1a
            let hash = word
                .to_lowercase()
                .bytes()
                .fold(0xcbf2_9ce4_8422_2325u64, |acc, b| {
                    (acc ^ b as u64).wrapping_mul(0x0100_0000_01b3)
                });
            let bucket = (hash % DIMS as u64) as usize;
            vector[bucket] += 1.0;
        }
        // Keep empty input off the zero vector
        vector[0] += 0.01;
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.texts.lock().push(text.to_string());
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::embedding("embedding service unreachable"));
        }
        Ok(Self::vectorize(text))
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "keyword"
    }
}

/// LLM double that records every prompt
///
/// Rewrite prompts are answered by echoing the question back (or with
/// `rewrite_to` when set); answer prompts by echoing the top context chunk.
#[derive(Default)]
pub(crate) struct ScriptedLlm {
    pub prompts: Mutex<Vec<(String, f32)>>,
    pub rewrite_to: Mutex<Option<String>>,
    pub fail_rewrite: AtomicBool,
    pub fail_answer: AtomicBool,
}

impl ScriptedLlm {
    pub fn call_count(&self) -> usize {
        self.prompts.lock().len()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().last().map(|(p, _)| p.clone())
    }

    fn section<'a>(prompt: &'a str, header: &str) -> &'a str {
        prompt
            .split_once(header)
            .map(|(_, rest)| rest.split("\n\n").next().unwrap_or_default())
            .unwrap_or_default()
            .trim()
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String> {
        self.prompts.lock().push((prompt.to_string(), temperature));

        if prompt.trim_end().ends_with("Standalone Search Query:") {
            if self.fail_rewrite.load(Ordering::SeqCst) {
                return Err(Error::llm("rewrite model timed out"));
            }
            if let Some(rewrite) = self.rewrite_to.lock().clone() {
                return Ok(rewrite);
            }
            return Ok(Self::section(prompt, "Question:\n").to_string());
        }

        if self.fail_answer.load(Ordering::SeqCst) {
            return Err(Error::llm("answer model timed out"));
        }
        Ok(format!("From the document: {}", Self::section(prompt, "Context:\n")))
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted"
    }
}

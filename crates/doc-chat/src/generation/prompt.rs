//! Prompt templates for query rewriting and grounded answering

use crate::retrieval::SearchResult;
use crate::types::Turn;

/// Label the rewrite prompt ends with; models sometimes echo it back
const REWRITE_LABEL: &str = "Standalone Search Query:";

/// Prompt builder for the chat pipeline
pub struct PromptBuilder;

impl PromptBuilder {
    /// Render turns as "Human: ..." / "AI: ..." lines
    pub fn format_history(history: &[Turn]) -> String {
        history
            .iter()
            .map(|turn| format!("{}: {}", turn.role.prompt_label(), turn.content))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Concatenate retrieved chunk texts in rank order
    pub fn build_context(results: &[SearchResult]) -> String {
        results
            .iter()
            .map(|r| r.chunk.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Ask the model to turn a follow-up into a self-contained search query
    pub fn build_rewrite_prompt(question: &str, history: &[Turn]) -> String {
        format!(
            r#"Based on chat history and the question, rephrase the question to be self-contained.
Resolve pronouns and references to earlier turns. Return only the rephrased question.

Chat History:
{history}

Question:
{question}

{label}"#,
            history = Self::format_history(history),
            question = question,
            label = REWRITE_LABEL
        )
    }

    /// Build the grounded answer prompt
    pub fn build_answer_prompt(question: &str, history: &[Turn], context: &str) -> String {
        format!(
            r#"You are a helpful document analyser.

Use ONLY the context to answer accurately. If the context does not contain the answer,
say that the information is not available in the provided document. Do not use outside knowledge.
Organise the response neatly using bullet points or numbering where helpful.

Chat History:
{history}

Context:
{context}

Question:
{question}

Answer:"#,
            history = Self::format_history(history),
            context = context,
            question = question
        )
    }

    /// Strip labels and quotes from a rewrite; empty output yields `fallback`
    pub fn clean_rewrite(output: &str, fallback: &str) -> String {
        let mut text = output.trim();
        if let Some(rest) = text.strip_prefix(REWRITE_LABEL) {
            text = rest.trim();
        }
        let text = text
            .trim_matches(|c: char| c == '"' || c == '\'' || c == '`')
            .trim();

        if text.is_empty() {
            fallback.to_string()
        } else {
            text.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Chunk;

    #[test]
    fn test_format_history() {
        let history = vec![
            Turn::user("How many years of Python?"),
            Turn::assistant("5 years."),
        ];
        assert_eq!(
            PromptBuilder::format_history(&history),
            "Human: How many years of Python?\nAI: 5 years."
        );
        assert_eq!(PromptBuilder::format_history(&[]), "");
    }

    #[test]
    fn test_context_keeps_rank_order() {
        let results = vec![
            SearchResult { chunk: Chunk::new(4, "best".into()), similarity: 0.9 },
            SearchResult { chunk: Chunk::new(1, "second".into()), similarity: 0.5 },
        ];
        assert_eq!(PromptBuilder::build_context(&results), "best\n\nsecond");
    }

    #[test]
    fn test_answer_prompt_contains_all_parts() {
        let history = vec![Turn::user("hi"), Turn::assistant("hello")];
        let prompt = PromptBuilder::build_answer_prompt("What about Java?", &history, "CTX");
        assert!(prompt.contains("Human: hi\nAI: hello"));
        assert!(prompt.contains("Context:\nCTX"));
        assert!(prompt.contains("Question:\nWhat about Java?"));
        assert!(prompt.contains("not available"));
    }

    #[test]
    fn test_clean_rewrite() {
        let output = "Standalone Search Query: \"How many years of Java experience?\"";
        assert_eq!(
            PromptBuilder::clean_rewrite(output, "x"),
            "How many years of Java experience?"
        );
        assert_eq!(PromptBuilder::clean_rewrite("  \n ", "raw question"), "raw question");
    }
}

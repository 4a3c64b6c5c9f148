//! Prompt templates for RAG queries

use crate::index::ScoredChunk;

/// The refusal line the model is instructed to use, also returned directly
/// when retrieval comes back empty
pub const NO_INFORMATION_ANSWER: &str =
    "I don't have enough information to answer this question.";

/// Prompt builder for RAG queries
pub struct PromptBuilder;

impl PromptBuilder {
    /// Build a numbered context block from retrieved chunks
    pub fn build_context(results: &[ScoredChunk]) -> String {
        let mut context = String::new();

        for (i, result) in results.iter().enumerate() {
            context.push_str(&format!(
                "[{}] {}\n\n{}\n\n---\n\n",
                i + 1,
                result.chunk.metadata.source,
                result.chunk.content
            ));
        }

        context
    }

    /// Build the full RAG prompt from the fixed template
    pub fn build_rag_prompt(question: &str, context: &str) -> String {
        format!(
            r#"You are a helpful assistant that answers questions based on the provided context.

Context:
{context}

Question:
{question}

Instructions:
- Answer the question based on the context provided.
- If the context doesn't contain the answer, say "{refusal}"
- Provide detailed and accurate answers.
- Cite specific parts of the context when relevant.

Answer:"#,
            context = context,
            question = question,
            refusal = NO_INFORMATION_ANSWER
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Chunk, Document, FileType};

    fn scored(content: &str, score: f32) -> ScoredChunk {
        let doc = Document::new("guide.txt".to_string(), FileType::Txt);
        ScoredChunk {
            chunk: Chunk::new(&doc, content.to_string(), 0),
            score,
        }
    }

    #[test]
    fn test_context_numbers_chunks_in_order() {
        let results = vec![scored("first passage", 0.9), scored("second passage", 0.7)];
        let context = PromptBuilder::build_context(&results);

        assert!(context.contains("[1]"));
        assert!(context.contains("first passage"));
        assert!(context.contains("[2]"));
        assert!(context.contains("second passage"));
        assert!(context.find("first passage").unwrap() < context.find("second passage").unwrap());
    }

    #[test]
    fn test_prompt_embeds_question_and_context() {
        let results = vec![scored("the sky is blue", 0.9)];
        let context = PromptBuilder::build_context(&results);
        let prompt = PromptBuilder::build_rag_prompt("What color is the sky?", &context);

        assert!(prompt.contains("What color is the sky?"));
        assert!(prompt.contains("the sky is blue"));
        assert!(prompt.contains(NO_INFORMATION_ANSWER));
    }
}

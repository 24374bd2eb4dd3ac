//! Prompt assembly and the single generation call

use docqa_core::{LLMProvider, Result, ScoredChunk};

use crate::config::DEFAULT_PROMPT_TEMPLATE;

/// Joins retrieved chunks into a context block and asks the model once
#[derive(Debug, Clone)]
pub struct AnswerComposer {
    template: String,
}

impl Default for AnswerComposer {
    fn default() -> Self {
        Self::new(DEFAULT_PROMPT_TEMPLATE)
    }
}

impl AnswerComposer {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Chunk texts in retrieval order, separated by a blank line
    pub fn build_context(&self, chunks: &[ScoredChunk]) -> String {
        chunks
            .iter()
            .map(|c| c.chunk.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Fill the instruction template in a single pass, so placeholder-like
    /// text inside the context or question is never expanded
    pub fn compose(&self, context: &str, question: &str) -> String {
        let question = question.trim();
        let mut prompt = String::with_capacity(self.template.len() + context.len() + question.len());
        let mut rest = self.template.as_str();

        while let Some(pos) = rest.find('{') {
            prompt.push_str(&rest[..pos]);
            let tail = &rest[pos..];
            if let Some(after) = tail.strip_prefix("{context}") {
                prompt.push_str(context);
                rest = after;
            } else if let Some(after) = tail.strip_prefix("{question}") {
                prompt.push_str(question);
                rest = after;
            } else {
                prompt.push('{');
                rest = &tail[1..];
            }
        }
        prompt.push_str(rest);
        prompt
    }

    /// Build the prompt and invoke the model; earlier turns are not included
    pub async fn answer(
        &self,
        llm: &dyn LLMProvider,
        chunks: &[ScoredChunk],
        question: &str,
    ) -> Result<String> {
        let prompt = self.compose(&self.build_context(chunks), question);
        let result = llm.generate(&prompt).await?;
        Ok(result.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docqa_core::Chunk;

    fn scored(text: &str) -> ScoredChunk {
        ScoredChunk {
            chunk: Chunk {
                index: 0,
                page: 1,
                offset: 0,
                text: text.to_string(),
            },
            score: 1.0,
        }
    }

    #[test]
    fn test_context_is_double_newline_joined() {
        let composer = AnswerComposer::default();
        let context = composer.build_context(&[scored("alpha"), scored("beta")]);
        assert_eq!(context, "alpha\n\nbeta");
    }

    #[test]
    fn test_compose_default_template() {
        let composer = AnswerComposer::default();
        let prompt = composer.compose("alpha\n\nbeta", " Why? ");
        assert_eq!(
            prompt,
            "You are an expert teacher. Answer based ONLY on this context: alpha\n\nbeta\n\nQuestion: Why?"
        );
    }

    #[test]
    fn test_question_placeholder_text_is_not_expanded() {
        let composer = AnswerComposer::new("Q: {question} C: {context} {other}");
        let prompt = composer.compose("uses {question}", "what is {context}?");
        assert_eq!(prompt, "Q: what is {context}? C: uses {question} {other}");
    }
}

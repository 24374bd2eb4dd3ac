//! Shared test doubles and snapshot tests for the pipeline

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use docqa_core::{Error, GenerationConfig, GenerationResult, LLMProvider, Result};

/// LLM double that records prompts and returns a canned answer
pub(crate) struct MockLLM {
    answer: Option<String>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockLLM {
    pub fn answering(answer: &str) -> Self {
        Self {
            answer: Some(answer.to_string()),
            prompts: Arc::default(),
        }
    }

    pub fn failing() -> Self {
        Self {
            answer: None,
            prompts: Arc::default(),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LLMProvider for MockLLM {
    async fn connect(&mut self) -> Result<()> {
        Ok(())
    }

    async fn generate(&self, prompt: &str) -> Result<GenerationResult> {
        self.generate_with_config(prompt, &GenerationConfig::default()).await
    }

    async fn generate_with_config(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<GenerationResult> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &self.answer {
            Some(text) => Ok(GenerationResult {
                text: text.clone(),
                model_id: config.model_id.clone(),
                tokens_used: None,
            }),
            None => Err(Error::GenerationService("503 Service Unavailable".to_string())),
        }
    }

    fn model_id(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod snapshot_tests {
    use crate::{ChunkingConfig, Page, RecursiveChunker};
    use insta::assert_yaml_snapshot;

    #[test]
    fn test_chunk_layout_snapshot() {
        let chunker = RecursiveChunker::new(ChunkingConfig::new(40, 10).unwrap()).unwrap();
        let pages = vec![
            Page {
                number: 1,
                text: "First paragraph is short.\n\nSecond paragraph runs a little longer than that.".to_string(),
            },
            Page {
                number: 2,
                text: "Tiny".to_string(),
            },
        ];

        let layout: Vec<(u32, usize, usize)> = chunker
            .chunk_pages(&pages)
            .iter()
            .map(|c| (c.page, c.offset, c.end()))
            .collect();

        assert_yaml_snapshot!(layout, @r###"
        - - 1
          - 0
          - 27
        - - 1
          - 19
          - 58
        - - 1
          - 49
          - 75
        - - 2
          - 0
          - 4
        "###);
    }
}

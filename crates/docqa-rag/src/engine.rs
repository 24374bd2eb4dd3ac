//! RAG pipeline: load, split, embed, index, retrieve, prompt, generate

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use docqa_core::{Embedder, LLMProvider, PdfDocument, Result, ScoredChunk};

use crate::chunker::RecursiveChunker;
use crate::composer::AnswerComposer;
use crate::config::RagConfig;
use crate::index::{DocumentIndex, Indexer};
use crate::ingest::PdfIngestor;
use crate::retriever::Retriever;

/// A generated answer and the chunks it was conditioned on
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub text: String,
    pub sources: Vec<ScoredChunk>,
}

/// Sequences the pipeline stages; holds no per-document state
pub struct RagPipeline {
    ingestor: PdfIngestor,
    chunker: RecursiveChunker,
    indexer: Indexer,
    retriever: Retriever,
    composer: AnswerComposer,
    embedding_model: String,
}

impl RagPipeline {
    pub fn new(config: RagConfig, embedder: Arc<dyn Embedder>) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            ingestor: PdfIngestor::new(),
            chunker: RecursiveChunker::new(config.chunking)?,
            indexer: Indexer::new(embedder.clone()),
            retriever: Retriever::new(embedder.clone(), config.top_k),
            composer: AnswerComposer::new(config.prompt_template),
            embedding_model: embedder.model_id().to_string(),
        })
    }

    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    pub fn top_k(&self) -> usize {
        self.retriever.top_k()
    }

    /// Parse uploaded bytes into pages
    pub fn load(&self, bytes: &[u8], source: &str) -> Result<PdfDocument> {
        self.ingestor.load_bytes(bytes, source)
    }

    /// Chunk and embed a loaded document into a fresh index
    pub async fn index(&self, document: &PdfDocument) -> Result<DocumentIndex> {
        let chunks = self.chunker.chunk_pages(&document.pages);
        info!(
            source = %document.source,
            chars = document.char_count(),
            chunks = chunks.len(),
            "chunked document"
        );
        self.indexer.build(document, chunks).await
    }

    /// Retrieve context for `question` and generate one answer
    pub async fn ask(
        &self,
        index: &DocumentIndex,
        question: &str,
        llm: &dyn LLMProvider,
    ) -> Result<Answer> {
        let sources = self.retriever.retrieve(index, question).await?;
        let text = self.composer.answer(llm, &sources, question).await?;
        Ok(Answer { text, sources })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedder::HashEmbedder;
    use crate::ingest::fixtures::pdf_with_pages;
    use crate::tests::MockLLM;
    use docqa_core::Error;

    fn pipeline() -> RagPipeline {
        RagPipeline::new(RagConfig::default(), Arc::new(HashEmbedder::default())).unwrap()
    }

    #[tokio::test]
    async fn test_end_to_end_prompt_contains_context_and_question() {
        let pipeline = pipeline();
        let bytes = pdf_with_pages(&[
            "Volcanoes form where tectonic plates diverge or converge",
            "Glaciers carve U shaped valleys",
        ]);

        let document = pipeline.load(&bytes, "geo.pdf").unwrap();
        let index = pipeline.index(&document).await.unwrap();
        assert_eq!(index.chunk_count, 2);

        let llm = MockLLM::answering("Plate boundaries.");
        let answer = pipeline
            .ask(&index, "Where do volcanoes form?", &llm)
            .await
            .unwrap();

        assert_eq!(answer.text, "Plate boundaries.");
        assert_eq!(answer.sources.len(), 2);

        let prompts = llm.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("tectonic plates"));
        assert!(prompts[0].ends_with("Question: Where do volcanoes form?"));
    }

    #[tokio::test]
    async fn test_generation_failure_is_surfaced() {
        let pipeline = pipeline();
        let bytes = pdf_with_pages(&["Some content"]);
        let document = pipeline.load(&bytes, "a.pdf").unwrap();
        let index = pipeline.index(&document).await.unwrap();

        let llm = MockLLM::failing();
        let result = pipeline.ask(&index, "anything", &llm).await;
        assert!(matches!(result, Err(Error::GenerationService(_))));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = RagConfig {
            top_k: 0,
            ..Default::default()
        };
        assert!(RagPipeline::new(config, Arc::new(HashEmbedder::default())).is_err());
    }
}

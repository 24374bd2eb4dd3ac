//! Top-K retrieval

use std::sync::Arc;

use tracing::debug;

use docqa_core::{Embedder, Error, Result, ScoredChunk, SearchConfig, VectorStore};

use crate::index::DocumentIndex;

/// Finds the chunks nearest to a question
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    config: SearchConfig,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn Embedder>, top_k: usize) -> Self {
        Self {
            embedder,
            config: SearchConfig {
                top_k,
                score_threshold: None,
            },
        }
    }

    pub fn top_k(&self) -> usize {
        self.config.top_k
    }

    /// Up to `top_k` chunks, most similar first; an empty index returns nothing
    pub async fn retrieve(&self, index: &DocumentIndex, question: &str) -> Result<Vec<ScoredChunk>> {
        let question = question.trim();
        if question.is_empty() {
            return Err(Error::InvalidInput("question is empty".to_string()));
        }
        if index.is_empty() {
            return Ok(Vec::new());
        }

        let vector = self.embedder.embed(question).await.map_err(|e| match e {
            Error::EmbeddingService(_) => e,
            other => Error::EmbeddingService(other.to_string()),
        })?;

        let results = index.store().search_by_vector(&vector, &self.config).await?;
        debug!(
            hits = results.len(),
            pages = ?results.iter().map(|r| r.chunk.page).collect::<Vec<_>>(),
            "retrieved chunks"
        );
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunker::RecursiveChunker;
    use crate::config::ChunkingConfig;
    use crate::embedder::HashEmbedder;
    use crate::index::Indexer;
    use docqa_core::{Page, PdfDocument};

    const FACTS: &[&str] = &[
        "The French Revolution began in 1789 with the storming of the Bastille.",
        "Photosynthesis converts light energy into chemical energy stored in glucose.",
        "The boiling point of mercury is 356.7 degrees Celsius at standard pressure.",
        "Newton's second law states that force equals mass times acceleration.",
        "The Treaty of Versailles was signed in 1919 after the First World War.",
        "DNA is a double helix made of nucleotides paired by hydrogen bonds.",
        "The speed of light in vacuum is about 299792 kilometres per second.",
        "Shakespeare wrote Hamlet around the year 1600 in London.",
    ];

    async fn course_index(embedder: Arc<dyn Embedder>) -> DocumentIndex {
        let pages: Vec<Page> = FACTS
            .iter()
            .enumerate()
            .map(|(i, fact)| Page {
                number: i as u32 + 1,
                text: fact.to_string(),
            })
            .collect();
        let document = PdfDocument {
            source: "course.pdf".to_string(),
            fingerprint: "f".to_string(),
            pages,
        };
        let chunker = RecursiveChunker::new(ChunkingConfig::default()).unwrap();
        let chunks = chunker.chunk_pages(&document.pages);
        Indexer::new(embedder).build(&document, chunks).await.unwrap()
    }

    #[tokio::test]
    async fn test_verbatim_answer_is_in_top_four() {
        let embedder: Arc<dyn Embedder> = Arc::new(HashEmbedder::default());
        let index = course_index(embedder.clone()).await;
        let retriever = Retriever::new(embedder, 4);

        let results = retriever
            .retrieve(&index, "What is the boiling point of mercury?")
            .await
            .unwrap();

        assert_eq!(results.len(), 4);
        assert!(results.iter().any(|r| r.chunk.text.contains("356.7 degrees")));
        assert_eq!(results[0].chunk.page, 3);
    }

    #[tokio::test]
    async fn test_results_are_sorted() {
        let embedder: Arc<dyn Embedder> = Arc::new(HashEmbedder::default());
        let index = course_index(embedder.clone()).await;
        let retriever = Retriever::new(embedder, 8);

        let results = retriever.retrieve(&index, "When was Hamlet written").await.unwrap();
        for pair in results.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[tokio::test]
    async fn test_blank_question_rejected() {
        let embedder: Arc<dyn Embedder> = Arc::new(HashEmbedder::default());
        let index = course_index(embedder.clone()).await;
        let retriever = Retriever::new(embedder, 4);

        assert!(matches!(
            retriever.retrieve(&index, "   ").await,
            Err(Error::InvalidInput(_))
        ));
    }
}

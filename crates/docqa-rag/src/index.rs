//! Index construction

use std::sync::Arc;

use tracing::{debug, info};

use docqa_core::{Chunk, Embedder, Error, IndexedChunk, PdfDocument, Result, VectorStore};

use crate::vector_store::InMemoryVectorStore;

/// A searchable index over one document's chunks
///
/// Built in one go and never updated afterwards; a new document gets a new index.
#[derive(Debug)]
pub struct DocumentIndex {
    pub source: String,
    pub fingerprint: String,
    pub page_count: usize,
    pub chunk_count: usize,
    store: InMemoryVectorStore,
}

impl DocumentIndex {
    pub fn store(&self) -> &InMemoryVectorStore {
        &self.store
    }

    pub fn is_empty(&self) -> bool {
        self.chunk_count == 0
    }
}

/// Embeds chunks and builds a [`DocumentIndex`]
pub struct Indexer {
    embedder: Arc<dyn Embedder>,
}

impl Indexer {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder }
    }

    /// Embed every chunk (one call each) and return the finished index
    pub async fn build(&self, document: &PdfDocument, chunks: Vec<Chunk>) -> Result<DocumentIndex> {
        let store = InMemoryVectorStore::new(self.embedder.dimension());
        let mut entries = Vec::with_capacity(chunks.len());

        for chunk in chunks {
            let embedding = self.embedder.embed(&chunk.text).await.map_err(|e| match e {
                Error::EmbeddingService(_) => e,
                other => Error::EmbeddingService(other.to_string()),
            })?;
            debug!(chunk = chunk.index, page = chunk.page, "embedded chunk");
            entries.push(IndexedChunk { chunk, embedding });
        }

        let chunk_count = store.insert_batch(entries).await?;
        info!(
            source = %document.source,
            pages = document.pages.len(),
            chunks = chunk_count,
            model = self.embedder.model_id(),
            "document indexed"
        );

        Ok(DocumentIndex {
            source: document.source.clone(),
            fingerprint: document.fingerprint.clone(),
            page_count: document.pages.len(),
            chunk_count,
            store,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedder::HashEmbedder;
    use async_trait::async_trait;
    use docqa_core::Page;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingEmbedder {
        calls: AtomicUsize,
        fail_after: Option<usize>,
    }

    #[async_trait]
    impl Embedder for CountingEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_after.is_some_and(|limit| n >= limit) {
                return Err(Error::Network("connection refused".to_string()));
            }
            Ok(vec![1.0, 0.0])
        }

        fn dimension(&self) -> usize {
            2
        }

        fn model_id(&self) -> &str {
            "counting"
        }
    }

    fn document(pages: usize) -> PdfDocument {
        PdfDocument {
            source: "notes.pdf".to_string(),
            fingerprint: "abc".to_string(),
            pages: (1..=pages as u32)
                .map(|n| Page {
                    number: n,
                    text: format!("page {}", n),
                })
                .collect(),
        }
    }

    fn chunks(n: usize) -> Vec<Chunk> {
        (0..n)
            .map(|i| Chunk {
                index: i,
                page: 1,
                offset: 0,
                text: format!("chunk {}", i),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_one_embedding_call_per_chunk() {
        let embedder = Arc::new(CountingEmbedder {
            calls: AtomicUsize::new(0),
            fail_after: None,
        });
        let indexer = Indexer::new(embedder.clone());

        let index = indexer.build(&document(2), chunks(5)).await.unwrap();

        assert_eq!(embedder.calls.load(Ordering::SeqCst), 5);
        assert_eq!(index.chunk_count, 5);
        assert_eq!(index.page_count, 2);
        assert_eq!(index.store().count().await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_zero_chunks_builds_empty_index() {
        let indexer = Indexer::new(Arc::new(HashEmbedder::default()));
        let index = indexer.build(&document(1), Vec::new()).await.unwrap();

        assert!(index.is_empty());
        assert_eq!(index.source, "notes.pdf");
    }

    #[tokio::test]
    async fn test_embedding_failure_aborts_ingestion() {
        let indexer = Indexer::new(Arc::new(CountingEmbedder {
            calls: AtomicUsize::new(0),
            fail_after: Some(2),
        }));

        let result = indexer.build(&document(1), chunks(4)).await;
        assert!(matches!(result, Err(Error::EmbeddingService(_))));
    }
}

//! In-memory vector store using cosine similarity

use async_trait::async_trait;
use tokio::sync::RwLock;

use docqa_core::{Error, IndexedChunk, Result, ScoredChunk, SearchConfig, VectorStore};

/// Brute-force nearest-neighbour store kept for the lifetime of a session
#[derive(Debug)]
pub struct InMemoryVectorStore {
    dimension: usize,
    entries: RwLock<Vec<IndexedChunk>>,
}

impl InMemoryVectorStore {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            entries: RwLock::new(Vec::new()),
        }
    }
}

/// Cosine similarity; 0.0 when either vector has zero magnitude
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn insert_batch(&self, entries: Vec<IndexedChunk>) -> Result<usize> {
        if let Some(bad) = entries.iter().find(|e| e.embedding.len() != self.dimension) {
            return Err(Error::VectorStore(format!(
                "chunk {} has {} dimensions, store expects {}",
                bad.chunk.index,
                bad.embedding.len(),
                self.dimension
            )));
        }

        let inserted = entries.len();
        self.entries.write().await.extend(entries);
        Ok(inserted)
    }

    async fn search_by_vector(&self, vector: &[f32], config: &SearchConfig) -> Result<Vec<ScoredChunk>> {
        if vector.len() != self.dimension {
            return Err(Error::VectorStore(format!(
                "query has {} dimensions, store expects {}",
                vector.len(),
                self.dimension
            )));
        }

        let entries = self.entries.read().await;
        let mut scored: Vec<ScoredChunk> = entries
            .iter()
            .map(|entry| ScoredChunk {
                chunk: entry.chunk.clone(),
                score: cosine_similarity(vector, &entry.embedding),
            })
            .filter(|s| config.score_threshold.is_none_or(|min| s.score >= min))
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.chunk.index.cmp(&b.chunk.index))
        });
        scored.truncate(config.top_k);
        Ok(scored)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.entries.read().await.len())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

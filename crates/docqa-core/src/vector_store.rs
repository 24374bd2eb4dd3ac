//! Vector store trait and types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{Chunk, Result};

/// A chunk together with its embedding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedChunk {
    pub chunk: Chunk,
    pub embedding: Vec<f32>,
}

/// A chunk returned by a similarity search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// Configuration for vector search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub top_k: usize,
    pub score_threshold: Option<f32>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            top_k: 4,
            score_threshold: None,
        }
    }
}

/// Trait for nearest-neighbour stores over chunk embeddings
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Add embedded chunks to the store
    async fn insert_batch(&self, entries: Vec<IndexedChunk>) -> Result<usize>;

    /// Search using a query embedding, best match first
    async fn search_by_vector(&self, vector: &[f32], config: &SearchConfig) -> Result<Vec<ScoredChunk>>;

    /// Get the total number of chunks
    async fn count(&self) -> Result<usize>;

    /// Dimension every stored vector must have
    fn dimension(&self) -> usize;
}

//! Retrieval-augmented question answering over a PDF
//!
//! This crate provides the pipeline stages: PDF ingestion, recursive chunking,
//! embedding backends, the in-memory index, retrieval and answer composition.

mod chunker;
mod composer;
mod config;
mod embedder;
mod engine;
mod index;
mod ingest;
mod retriever;
mod vector_store;

#[cfg(test)]
mod tests;

pub use chunker::RecursiveChunker;
pub use composer::AnswerComposer;
pub use config::{
    ChunkingConfig, DEFAULT_PROMPT_TEMPLATE, EmbeddingBackend, EmbeddingConfig, RagConfig,
};
pub use embedder::{HashEmbedder, RemoteEmbedder, build_embedder};
#[cfg(feature = "local-embeddings")]
pub use embedder::FastEmbedder;
pub use engine::{Answer, RagPipeline};
pub use index::{DocumentIndex, Indexer};
pub use ingest::{PdfIngestor, fingerprint};
pub use retriever::Retriever;
pub use vector_store::{InMemoryVectorStore, cosine_similarity};

#[cfg(feature = "test-support")]
pub use ingest::fixtures;

// Re-export core types for convenience
pub use docqa_core::{
    Chunk, Embedder, Error, IndexedChunk, LLMProvider, Page, PdfDocument, Result, ScoredChunk,
    SearchConfig, VectorStore,
};

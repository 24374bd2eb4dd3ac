//! Core traits and types for docqa
//!
//! This crate defines the data model (pages, chunks, conversation turns) and the
//! capability-facing interfaces for LLM providers, embedders and vector stores,
//! so the pipeline and the session can be tested against in-memory fakes.

pub mod conversation;
pub mod document;
pub mod embedding;
pub mod error;
pub mod llm;
pub mod vector_store;

#[cfg(test)]
mod tests;

pub use conversation::{ConversationTurn, Role};
pub use document::{Chunk, Page, PdfDocument};
pub use embedding::{DEFAULT_EMBEDDING_DIMENSION, DEFAULT_EMBEDDING_MODEL, Embedder};
pub use error::{Error, Result};
pub use llm::{DEFAULT_MODEL, GenerationConfig, GenerationResult, LLMProvider};
pub use vector_store::{IndexedChunk, ScoredChunk, SearchConfig, VectorStore};

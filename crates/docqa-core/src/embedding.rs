//! Embedding trait

use async_trait::async_trait;

use crate::Result;

/// Name of the sentence-transformer model the tool embeds with by default
pub const DEFAULT_EMBEDDING_MODEL: &str = "all-MiniLM-L6-v2";

/// Output dimension of [`DEFAULT_EMBEDDING_MODEL`]
pub const DEFAULT_EMBEDDING_DIMENSION: usize = 384;

/// Converts text into a fixed-dimension vector
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed one piece of text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Dimension of every vector this embedder returns
    fn dimension(&self) -> usize;

    /// Model identifier, for logs and `/status`
    fn model_id(&self) -> &str;
}

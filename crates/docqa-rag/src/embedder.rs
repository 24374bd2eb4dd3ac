//! Embedding backends
//!
//! `FastEmbedder` (feature `local-embeddings`) runs all-MiniLM-L6-v2 in-process.
//! [`RemoteEmbedder`] calls an OpenAI-compatible `/embeddings` endpoint serving
//! the same model. [`HashEmbedder`] is an offline fallback that hashes words and
//! word pairs into a fixed number of buckets.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use docqa_core::{DEFAULT_EMBEDDING_DIMENSION, Embedder, Error, Result};

use crate::config::{EmbeddingBackend, EmbeddingConfig};

#[cfg(feature = "local-embeddings")]
pub use local::FastEmbedder;

/// Pick the backend described by the configuration
pub fn build_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>> {
    match config.backend {
        EmbeddingBackend::Local => local_embedder(config),
        EmbeddingBackend::Remote => {
            let url = config.api_url.clone().ok_or_else(|| {
                Error::Configuration("remote embeddings need EMBEDDING_API_URL".to_string())
            })?;
            let mut embedder = RemoteEmbedder::new(url, config.model.clone(), config.dimension)?;
            if let Some(key) = &config.api_key {
                embedder = embedder.with_api_key(key.clone());
            }
            Ok(Arc::new(embedder))
        }
        EmbeddingBackend::Hashed => Ok(Arc::new(HashEmbedder::new(config.dimension))),
    }
}

#[cfg(feature = "local-embeddings")]
fn local_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>> {
    Ok(Arc::new(FastEmbedder::new(&config.model, config.dimension)?))
}

#[cfg(not(feature = "local-embeddings"))]
fn local_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>> {
    tracing::warn!(
        model = %config.model,
        "built without local-embeddings; falling back to hashed embeddings"
    );
    Ok(Arc::new(HashEmbedder::new(config.dimension)))
}

#[cfg(feature = "local-embeddings")]
mod local {
    use std::sync::Arc;

    use async_trait::async_trait;
    use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
    use tokio::sync::OnceCell;
    use tracing::info;

    use docqa_core::{Embedder, Error, Result};

    /// all-MiniLM-L6-v2 through fastembed's ONNX runtime
    ///
    /// The model is fetched and loaded on the first call, not at construction,
    /// so startup stays fast and a missing download surfaces as an
    /// embedding error on upload.
    pub struct FastEmbedder {
        model_name: String,
        model: EmbeddingModel,
        dimension: usize,
        runtime: OnceCell<Arc<TextEmbedding>>,
    }

    impl FastEmbedder {
        pub fn new(model_name: &str, dimension: usize) -> Result<Self> {
            let model = match model_name {
                "all-MiniLM-L6-v2" | "sentence-transformers/all-MiniLM-L6-v2" => {
                    EmbeddingModel::AllMiniLML6V2
                }
                other => {
                    return Err(Error::Configuration(format!(
                        "local embeddings support all-MiniLM-L6-v2 only, got '{}'",
                        other
                    )));
                }
            };
            if dimension != 384 {
                return Err(Error::Configuration(format!(
                    "all-MiniLM-L6-v2 produces 384 dimensions, configured {}",
                    dimension
                )));
            }

            Ok(Self {
                model_name: model_name.to_string(),
                model,
                dimension,
                runtime: OnceCell::new(),
            })
        }

        async fn runtime(&self) -> Result<Arc<TextEmbedding>> {
            let model = self.model.clone();
            let runtime = self
                .runtime
                .get_or_try_init(|| async move {
                    info!(?model, "loading local embedding model");
                    let loaded = tokio::task::spawn_blocking(move || {
                        TextEmbedding::try_new(
                            InitOptions::new(model).with_show_download_progress(false),
                        )
                    })
                    .await
                    .map_err(|e| Error::EmbeddingService(e.to_string()))?
                    .map_err(|e| Error::EmbeddingService(format!("could not load model: {}", e)))?;
                    Ok::<_, Error>(Arc::new(loaded))
                })
                .await?;
            Ok(runtime.clone())
        }
    }

    #[async_trait]
    impl Embedder for FastEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let runtime = self.runtime().await?;
            let text = text.to_string();
            let mut vectors = tokio::task::spawn_blocking(move || runtime.embed(vec![text], None))
                .await
                .map_err(|e| Error::EmbeddingService(e.to_string()))?
                .map_err(|e| Error::EmbeddingService(e.to_string()))?;

            let vector = vectors
                .pop()
                .ok_or_else(|| Error::EmbeddingService("model returned no embedding".to_string()))?;
            if vector.len() != self.dimension {
                return Err(Error::EmbeddingService(format!(
                    "expected {} dimensions, got {}",
                    self.dimension,
                    vector.len()
                )));
            }
            Ok(vector)
        }

        fn dimension(&self) -> usize {
            self.dimension
        }

        fn model_id(&self) -> &str {
            &self.model_name
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_only_minilm_is_accepted() {
            assert!(FastEmbedder::new("all-MiniLM-L6-v2", 384).is_ok());
            assert!(matches!(
                FastEmbedder::new("bge-large", 1024),
                Err(Error::Configuration(_))
            ));
            assert!(matches!(
                FastEmbedder::new("all-MiniLM-L6-v2", 768),
                Err(Error::Configuration(_))
            ));
        }
    }
}

/// Deterministic bag-of-words embedder that needs no network
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimension: usize,
    tokens: Regex,
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_EMBEDDING_DIMENSION)
    }
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
            tokens: Regex::new(r"\w+").expect("static token pattern"),
        }
    }

    fn bucket(&self, feature: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        feature.hash(&mut hasher);
        (hasher.finish() % self.dimension as u64) as usize
    }

    /// Embed synchronously; the async trait method delegates here
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let lowered = text.to_lowercase();
        let words: Vec<&str> = self.tokens.find_iter(&lowered).map(|m| m.as_str()).collect();

        let mut vector = vec![0.0f32; self.dimension];
        for word in &words {
            vector[self.bucket(word)] += 1.0;
        }
        for pair in words.windows(2) {
            let bigram = format!("{} {}", pair[0], pair[1]);
            vector[self.bucket(&bigram)] += 0.5;
        }

        let magnitude: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for value in vector.iter_mut() {
                *value /= magnitude;
            }
        }
        vector
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed_text(text))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_id(&self) -> &str {
        "hashed-bag-of-words"
    }
}

/// Embedder backed by an OpenAI-compatible embeddings endpoint
pub struct RemoteEmbedder {
    client: Client,
    api_url: String,
    api_key: Option<String>,
    model: String,
    dimension: usize,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl RemoteEmbedder {
    pub fn new(api_url: impl Into<String>, model: impl Into<String>, dimension: usize) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| Error::EmbeddingService(e.to_string()))?;

        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            api_key: None,
            model: model.into(),
            dimension,
        })
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

#[async_trait]
impl Embedder for RemoteEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/embeddings", self.api_url);
        let body = EmbeddingRequest {
            model: &self.model,
            input: vec![text],
        };

        let mut request = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::EmbeddingService(format!("{} unreachable: {}", url, e)))?;

        let status = response.status();
        let raw = response
            .text()
            .await
            .map_err(|e| Error::EmbeddingService(e.to_string()))?;

        if !status.is_success() {
            return Err(Error::EmbeddingService(format!(
                "embedding request failed with status {}: {}",
                status,
                raw.trim()
            )));
        }

        let embedding = parse_embedding(&raw, self.dimension)?;
        debug!(model = %self.model, chars = text.len(), "embedded text remotely");
        Ok(embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

fn parse_embedding(raw: &str, dimension: usize) -> Result<Vec<f32>> {
    let parsed: EmbeddingResponse =
        serde_json::from_str(raw).map_err(|e| Error::EmbeddingService(format!("bad response: {}", e)))?;

    let embedding = parsed
        .data
        .into_iter()
        .next()
        .map(|d| d.embedding)
        .ok_or_else(|| Error::EmbeddingService("response contained no embedding".to_string()))?;

    if embedding.len() != dimension {
        return Err(Error::EmbeddingService(format!(
            "expected {} dimensions, got {}",
            dimension,
            embedding.len()
        )));
    }
    Ok(embedding)
}

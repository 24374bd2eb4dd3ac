//! Pipeline configuration

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

use docqa_core::{DEFAULT_EMBEDDING_DIMENSION, DEFAULT_EMBEDDING_MODEL, Error, Result};

/// Instruction template sent to the model; `{context}` and `{question}` are filled in
pub const DEFAULT_PROMPT_TEMPLATE: &str =
    "You are an expert teacher. Answer based ONLY on this context: {context}\n\nQuestion: {question}";

/// Chunk window configuration, in characters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

impl ChunkingConfig {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        let config = Self {
            chunk_size,
            chunk_overlap,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::InvalidInput("chunk size must be positive".to_string()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(Error::InvalidInput(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

/// Retrieval and prompt settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    pub chunking: ChunkingConfig,
    pub top_k: usize,
    pub prompt_template: String,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunking: ChunkingConfig::default(),
            top_k: 4,
            prompt_template: DEFAULT_PROMPT_TEMPLATE.to_string(),
        }
    }
}

impl RagConfig {
    /// Create configuration from environment variables, falling back to defaults
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = Self::default();
        if let Some(size) = parse_var("DOCQA_CHUNK_SIZE")? {
            config.chunking.chunk_size = size;
        }
        if let Some(overlap) = parse_var("DOCQA_CHUNK_OVERLAP")? {
            config.chunking.chunk_overlap = overlap;
        }
        if let Some(top_k) = parse_var("DOCQA_TOP_K")? {
            config.top_k = top_k;
        }
        if let Ok(template) = env::var("DOCQA_PROMPT_TEMPLATE") {
            config.prompt_template = template.replace("\\n", "\n");
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.chunking.validate()?;
        if self.top_k == 0 {
            return Err(Error::Configuration("top_k must be at least 1".to_string()));
        }
        for placeholder in ["{context}", "{question}"] {
            if !self.prompt_template.contains(placeholder) {
                return Err(Error::Configuration(format!(
                    "prompt template is missing the {} placeholder",
                    placeholder
                )));
            }
        }
        Ok(())
    }
}

/// Which embedder serves the index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// The sentence-transformer model run in-process by fastembed
    Local,
    /// An OpenAI-compatible `/embeddings` endpoint
    Remote,
    /// Hashed bag of words, no model download
    Hashed,
}

impl FromStr for EmbeddingBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "local" | "fastembed" => Ok(Self::Local),
            "remote" | "api" => Ok(Self::Remote),
            "hashed" | "hash" | "offline" => Ok(Self::Hashed),
            other => Err(Error::Configuration(format!(
                "EMBEDDING_BACKEND must be local, remote or hashed, got '{}'",
                other
            ))),
        }
    }
}

/// Where embeddings come from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub backend: EmbeddingBackend,
    /// OpenAI-compatible base URL, required by the remote backend
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub model: String,
    pub dimension: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::Local,
            api_url: None,
            api_key: None,
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            dimension: DEFAULT_EMBEDDING_DIMENSION,
        }
    }
}

impl EmbeddingConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = Self::default();
        config.api_url = env::var("EMBEDDING_API_URL")
            .ok()
            .filter(|u| !u.trim().is_empty())
            .map(|u| u.trim_end_matches('/').to_string());
        config.api_key = env::var("EMBEDDING_API_KEY").ok().filter(|k| !k.is_empty());
        if let Ok(model) = env::var("EMBEDDING_MODEL") {
            config.model = model;
        }
        if let Some(dimension) = parse_var("EMBEDDING_DIMENSION")? {
            config.dimension = dimension;
        }
        config.backend = match env::var("EMBEDDING_BACKEND") {
            Ok(raw) => raw.parse()?,
            Err(_) if config.api_url.is_some() => EmbeddingBackend::Remote,
            Err(_) => EmbeddingBackend::Local,
        };
        if config.backend == EmbeddingBackend::Remote && config.api_url.is_none() {
            return Err(Error::Configuration(
                "EMBEDDING_API_URL is required for the remote embedding backend".to_string(),
            ));
        }
        if config.dimension == 0 {
            return Err(Error::Configuration(
                "EMBEDDING_DIMENSION must be positive".to_string(),
            ));
        }

        Ok(config)
    }
}

fn parse_var<T: FromStr>(name: &str) -> Result<Option<T>> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::Configuration(format!("{} has an invalid value '{}'", name, raw))),
        Err(_) => Ok(None),
    }
}

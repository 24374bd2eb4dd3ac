//! Groq configuration

use serde::{Deserialize, Serialize};
use std::env;
use docqa_core::{DEFAULT_MODEL, Error, Result};

pub const DEFAULT_API_URL: &str = "https://api.groq.com/openai/v1";

/// Configuration for the Groq client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroqConfig {
    pub api_key: String,
    pub api_url: String,
    pub model: String,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl GroqConfig {
    /// Use the given key, taking everything else from the environment
    pub fn with_env_defaults(api_key: impl Into<String>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = Self::new(api_key);

        if let Ok(url) = env::var("GROQ_API_URL") {
            config.api_url = url.trim_end_matches('/').to_string();
        }
        if let Ok(model) = env::var("GROQ_MODEL") {
            config.model = model;
        }
        if let Ok(raw) = env::var("GROQ_TEMPERATURE") {
            config.temperature = raw.parse().map_err(|_| {
                Error::Configuration(format!("GROQ_TEMPERATURE must be a number, got '{}'", raw))
            })?;
        }
        if let Ok(raw) = env::var("GROQ_TIMEOUT_SECS") {
            config.timeout_secs = raw.parse().map_err(|_| {
                Error::Configuration(format!("GROQ_TIMEOUT_SECS must be an integer, got '{}'", raw))
            })?;
        }

        Ok(config)
    }

    /// Create configuration with explicit values
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_url: DEFAULT_API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.0,
            timeout_secs: 60,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

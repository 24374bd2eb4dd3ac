//! Groq chat completions client

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

use docqa_core::{Error, GenerationConfig, GenerationResult, LLMProvider, Result};

use crate::config::GroqConfig;

/// Groq client speaking the OpenAI-compatible chat completions API
pub struct GroqClient {
    config: GroqConfig,
    client: Client,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    pub stream: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatUsage {
    total_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl GroqClient {
    /// Create a new Groq client from configuration
    pub fn new(config: GroqConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self {
            config,
            client,
        })
    }

    fn ensure_key(&self) -> Result<&str> {
        let key = self.config.api_key.trim();
        if key.is_empty() {
            return Err(Error::MissingCredential);
        }
        Ok(key)
    }

    async fn perform_generation(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<GenerationResult> {
        let key = self.ensure_key()?;
        let request_body = build_request(prompt, config);
        let url = format!("{}/chat/completions", self.config.api_url);

        debug!(model = %config.model_id, prompt_chars = prompt.len(), "sending chat completion");

        let response = self
            .client
            .post(&url)
            .bearer_auth(key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(status_error(status, &body));
        }

        let (text, tokens_used) = parse_completion(&body)?;

        Ok(GenerationResult {
            text,
            model_id: config.model_id.clone(),
            tokens_used,
        })
    }
}

#[async_trait]
impl LLMProvider for GroqClient {
    async fn connect(&mut self) -> Result<()> {
        let key = self.ensure_key()?.to_string();

        let url = format!("{}/models", self.config.api_url);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&key)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }

        debug!(model = %self.config.model, "groq credential verified");
        Ok(())
    }

    async fn generate(&self, prompt: &str) -> Result<GenerationResult> {
        let config = GenerationConfig {
            model_id: self.config.model.clone(),
            temperature: self.config.temperature,
            timeout: Duration::from_secs(self.config.timeout_secs),
            ..Default::default()
        };
        self.generate_with_config(prompt, &config).await
    }

    async fn generate_with_config(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<GenerationResult> {
        let generation_future = self.perform_generation(prompt, config);

        match timeout(config.timeout, generation_future).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout("Request timed out".to_string())),
        }
    }

    fn model_id(&self) -> &str {
        &self.config.model
    }
}

/// Build the single-message request body for a prompt
pub(crate) fn build_request(prompt: &str, config: &GenerationConfig) -> ChatRequest {
    ChatRequest {
        model: config.model_id.clone(),
        messages: vec![ChatMessage {
            role: "user",
            content: prompt.to_string(),
        }],
        temperature: config.temperature,
        max_tokens: config.max_tokens,
        stream: false,
    }
}

/// Extract the answer text and token usage from a completion body
pub(crate) fn parse_completion(body: &str) -> Result<(String, Option<u32>)> {
    let parsed: ChatResponse =
        serde_json::from_str(body).map_err(|e| Error::Serialization(e.to_string()))?;

    let text = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|t| t.trim().to_string())
        .unwrap_or_default();

    if text.is_empty() {
        return Err(Error::GenerationService(
            "Model returned an empty answer".to_string(),
        ));
    }

    Ok((text, parsed.usage.and_then(|u| u.total_tokens)))
}

/// Map a non-success HTTP status to the matching error kind
pub(crate) fn status_error(status: StatusCode, body: &str) -> Error {
    let detail = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.trim().to_string());

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Error::Authentication(format!("API key rejected ({}): {}", status, detail))
        }
        _ => Error::GenerationService(format!(
            "Groq API request failed with status {}: {}",
            status, detail
        )),
    }
}

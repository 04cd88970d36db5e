use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::TransportError;

const SERVICE: &str = "Claude API";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// Raw text completion. The judges sit on top of this and never see HTTP.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, TransportError>;
}

#[derive(Serialize)]
struct ClaudeRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message>,
}

#[derive(Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ClaudeResponse {
    content: Vec<Content>,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    text: String,
}

pub struct ClaudeClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl ClaudeClient {
    pub fn new(api_key: String, model: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key,
            model,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl LanguageModel for ClaudeClient {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, TransportError> {
        let request = ClaudeRequest {
            model: self.model.clone(),
            max_tokens,
            temperature: 0.3,
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|source| TransportError::Request {
                service: SERVICE,
                source,
            })?;

        if !response.status().is_success() {
            return Err(TransportError::from_response(SERVICE, response).await);
        }

        let claude_response = response
            .json::<ClaudeResponse>()
            .await
            .map_err(|source| TransportError::Decode {
                service: SERVICE,
                source,
            })?;

        let text = claude_response
            .content
            .first()
            .map(|c| c.text.trim())
            .unwrap_or("");

        if text.is_empty() {
            return Err(TransportError::EmptyCompletion { service: SERVICE });
        }

        Ok(text.to_string())
    }
}

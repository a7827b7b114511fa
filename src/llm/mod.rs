use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, info, warn};

use crate::constants::ollama::{CHAT_PATH, GENERATE_PATH, TAGS_PATH};
use crate::error::{CompletionError, FetchError};

/// One chat turn.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".to_string(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: "assistant".to_string(), content: content.into() }
    }
}

/// Completion calls against a model server. Every call is one round trip; no retries.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Single-prompt completion.
    async fn generate(&self, model: &str, prompt: &str, temperature: f32) -> Result<String, CompletionError>;

    /// Multi-turn chat completion, returns the assistant message text.
    async fn chat(&self, model: &str, messages: &[ChatMessage], temperature: f32) -> Result<String, CompletionError>;
}

#[derive(Serialize)]
struct ModelOptions {
    temperature: f32,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: ModelOptions,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    options: ModelOptions,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct TagsResponse {
    models: Vec<TagEntry>,
}

#[derive(Deserialize)]
struct TagEntry {
    name: String,
}

/// HTTP client for an Ollama server.
#[derive(Clone, Debug)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
}

impl OllamaClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "HTTP client builder failed, using defaults without the {:?} timeout", timeout);
                Client::new()
            });
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /api/tags`, model names in server order.
    pub async fn list_models(&self) -> Result<Vec<String>, FetchError> {
        let url = format!("{}{}", self.base_url, TAGS_PATH);
        info!("📚 Fetching model list from {}", url);

        let response = self.client.get(&url).send().await.map_err(|e| {
            error!(error = %e, url = %url, "Model server not reachable");
            FetchError::Unreachable { url: url.clone(), reason: e.to_string() }
        })?;

        let status = response.status();
        if !status.is_success() {
            error!(status = %status, url = %url, "Model listing returned error status");
            return Err(FetchError::Status { url, status: status.as_u16() });
        }

        let tags: TagsResponse = response.json().await.map_err(|e| FetchError::Decode {
            url: url.clone(),
            reason: e.to_string(),
        })?;

        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    async fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<reqwest::Response, CompletionError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.client.post(&url).json(body).send().await.map_err(|e| {
            error!(error = %e, url = %url, "Completion request failed");
            if e.is_connect() {
                CompletionError::Request(format!("Ollama server not reachable at {}", self.base_url))
            } else {
                CompletionError::Request(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Completion endpoint returned error status");
            return Err(CompletionError::Status { status: status.as_u16(), body });
        }
        Ok(response)
    }
}

#[async_trait]
impl LlmBackend for OllamaClient {
    async fn generate(&self, model: &str, prompt: &str, temperature: f32) -> Result<String, CompletionError> {
        info!("🤖 Sending completion to {} (model: {}, temperature: {:.2})", self.base_url, model, temperature);
        let request = GenerateRequest {
            model,
            prompt,
            stream: false,
            options: ModelOptions { temperature },
        };

        let response = self.post_json(GENERATE_PATH, &request).await?;
        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::Malformed(e.to_string()))?;

        info!("🤖 Completion received ({} chars)", body.response.len());
        Ok(body.response)
    }

    async fn chat(&self, model: &str, messages: &[ChatMessage], temperature: f32) -> Result<String, CompletionError> {
        info!("🤖 Sending chat to {} (model: {}, {} messages)", self.base_url, model, messages.len());
        let request = ChatRequest {
            model,
            messages,
            stream: false,
            options: ModelOptions { temperature },
        };

        let response = self.post_json(CHAT_PATH, &request).await?;
        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::Malformed(e.to_string()))?;

        Ok(body.message.content)
    }
}

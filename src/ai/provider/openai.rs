//! OpenAI-compatible Remote Backend
//!
//! Chat completions request against any OpenAI-compatible endpoint,
//! authenticated with a bearer credential. The status code of an error
//! response distinguishes rate-limit, auth, and transient failures for
//! the gateway's retry decisions.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::LlmProvider;
use crate::config::LlmConfig;
use crate::types::{ErrorCategory, ErrorClassifier, LlmError, Result, SyncError};

const DEFAULT_MODEL: &str = "meta-llama/Llama-4-Maverick-17B-128E-Instruct-FP8";

const SYSTEM_PROMPT: &str = "You are a technical documentation assistant. You describe \
source code for a project's README.md file. Output valid, concise Markdown with no \
conversational remarks, based only on the provided content.";

/// OpenAI-compatible API backend with secure key handling
pub struct OpenAiProvider {
    /// API key stored securely - never exposed in logs or debug output
    api_key: SecretString,
    endpoint: String,
    model: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("api_key", &"[REDACTED]")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish()
    }
}

impl OpenAiProvider {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("DOCSYNC_API_KEY").ok())
            .ok_or_else(|| {
                SyncError::Config(
                    "remote API key not found. Set DOCSYNC_API_KEY or llm.api_key in config"
                        .to_string(),
                )
            })?;

        let endpoint = config.endpoint.clone().ok_or_else(|| {
            SyncError::Config("llm.endpoint is required for the openai backend".to_string())
        })?;
        let endpoint = Self::validate_endpoint(&endpoint)?;

        let model = config
            .model
            .clone()
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SyncError::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key: SecretString::from(api_key),
            endpoint,
            model,
            client,
        })
    }

    fn validate_endpoint(endpoint: &str) -> Result<String> {
        let url = url::Url::parse(endpoint).map_err(|e| {
            SyncError::Config(format!("invalid endpoint URL '{}': {}", endpoint, e))
        })?;

        if url.scheme() != "https" && url.host_str() != Some("localhost") {
            warn!(
                "remote endpoint does not use https: {}. The bearer credential travels in the clear.",
                endpoint
            );
        }

        let mut result = url.to_string();
        if result.ends_with('/') {
            result.pop();
        }
        Ok(result)
    }

    fn build_request(&self, prompt: &str) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn generate(&self, prompt: &str) -> Result<String> {
        debug!("Sending request to remote API (model: {})", self.model);

        let url = format!("{}/chat/completions", self.endpoint);
        let request = self.build_request(prompt);

        let response = self
            .client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| SyncError::Llm(ErrorClassifier::classify_transport(&e, "openai")))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::Llm(ErrorClassifier::classify_http_status(
                status, &body, "openai",
            )));
        }

        let body: ChatCompletionResponse = response.json().await.map_err(|e| {
            SyncError::Llm(LlmError::with_backend(
                ErrorCategory::Transient,
                format!("failed to parse chat completion response: {}", e),
                "openai",
            ))
        })?;

        let text = body
            .choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .map(str::trim)
            .unwrap_or_default()
            .to_string();

        if text.is_empty() {
            return Err(SyncError::Llm(LlmError::with_backend(
                ErrorCategory::Transient,
                "remote API returned no content in the first choice",
                "openai",
            )));
        }

        Ok(text)
    }

    async fn warm(&self) -> Result<()> {
        // Remote APIs keep models resident; nothing to load
        Ok(())
    }

    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/models", self.endpoint);

        let response = self
            .client
            .get(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => {
                info!("Remote API is available");
                Ok(true)
            }
            Ok(resp) => {
                warn!("Remote API check failed: {}", resp.status());
                Ok(false)
            }
            Err(e) => {
                warn!("Remote API check failed: {}", e);
                Ok(false)
            }
        }
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

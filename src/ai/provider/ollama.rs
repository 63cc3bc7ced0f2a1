//! Ollama Local LLM Backend
//!
//! Single request/response exchange against a locally running Ollama
//! daemon. Failures are classified so the gateway can tell a cold model
//! load apart from a generic server error.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::LlmProvider;
use crate::config::LlmConfig;
use crate::constants::network;
use crate::types::{ErrorCategory, ErrorClassifier, LlmError, Result, SyncError};

const DEFAULT_ENDPOINT: &str = "http://localhost:11434";
const DEFAULT_MODEL: &str = "qwen2.5-coder:3b";

/// Trivial prompt used by warm requests
const WARM_PROMPT: &str = "Hello, world!";

/// Ollama Local LLM Backend
pub struct OllamaProvider {
    endpoint: String,
    model: String,
    num_ctx: usize,
    client: reqwest::Client,
    /// Warm requests may block on a cold model load, so they get a
    /// dedicated client with a much longer timeout
    warm_client: reqwest::Client,
}

impl OllamaProvider {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let endpoint = config
            .endpoint
            .clone()
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let endpoint = Self::validate_endpoint(&endpoint)?;

        let model = config
            .model
            .clone()
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SyncError::Config(format!("failed to create HTTP client: {}", e)))?;

        let warm_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(
                config.timeout_secs.max(network::WARM_TIMEOUT_SECS),
            ))
            .build()
            .map_err(|e| SyncError::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            endpoint,
            model,
            num_ctx: config.context_tokens(),
            client,
            warm_client,
        })
    }

    /// Validate endpoint URL for security (SSRF prevention)
    ///
    /// Only allows http/https schemes and warns for non-localhost endpoints.
    fn validate_endpoint(endpoint: &str) -> Result<String> {
        let url = url::Url::parse(endpoint).map_err(|e| {
            SyncError::Config(format!("invalid Ollama endpoint URL '{}': {}", endpoint, e))
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(SyncError::Config(format!(
                "Ollama endpoint must use http or https scheme, got: {}",
                url.scheme()
            )));
        }

        if let Some(host) = url.host_str()
            && !matches!(host, "localhost" | "127.0.0.1" | "::1")
        {
            warn!(
                "Ollama endpoint is not localhost: {}. Ensure this is intentional.",
                host
            );
        }

        let mut result = url.to_string();
        if result.ends_with('/') {
            result.pop();
        }
        Ok(result)
    }

    fn build_request(&self, prompt: &str) -> GenerateRequest {
        GenerateRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
            options: GenerateOptions {
                num_ctx: self.num_ctx,
            },
        }
    }

    async fn post_generate(&self, client: &reqwest::Client, prompt: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.endpoint);
        let request = self.build_request(prompt);

        let response = client.post(&url).json(&request).send().await.map_err(|e| {
            if e.is_connect() {
                SyncError::Llm(LlmError::with_backend(
                    ErrorCategory::Network,
                    format!(
                        "failed to connect to Ollama at {}. Is Ollama running? Start with: ollama serve",
                        self.endpoint
                    ),
                    "ollama",
                ))
            } else {
                SyncError::Llm(ErrorClassifier::classify_transport(&e, "ollama"))
            }
        })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::Llm(ErrorClassifier::classify_http_status(
                status, &body, "ollama",
            )));
        }

        let body: GenerateResponse = response.json().await.map_err(|e| {
            SyncError::Llm(LlmError::with_backend(
                ErrorCategory::Transient,
                format!("failed to parse Ollama response: {}", e),
                "ollama",
            ))
        })?;

        if let Some(error) = body.error {
            return Err(SyncError::Llm(ErrorClassifier::classify_http_status(
                500, &error, "ollama",
            )));
        }

        let text = body.response.trim().to_string();
        if text.is_empty() {
            return Err(SyncError::Llm(LlmError::with_backend(
                ErrorCategory::Transient,
                "Ollama returned an empty response with no error message",
                "ollama",
            )));
        }

        Ok(text)
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    async fn generate(&self, prompt: &str) -> Result<String> {
        debug!("Sending request to Ollama (model: {})", self.model);
        self.post_generate(&self.client, prompt).await
    }

    async fn warm(&self) -> Result<()> {
        info!("Warming Ollama model {}", self.model);
        self.post_generate(&self.warm_client, WARM_PROMPT).await?;
        Ok(())
    }

    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.endpoint);

        match self.client.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => {
                if let Ok(tags) = resp.json::<TagsResponse>().await {
                    let model_available = tags.models.iter().any(|m| {
                        m.name == self.model
                            || m.name.starts_with(&self.model.replace(":latest", ""))
                    });

                    if model_available {
                        info!("Ollama is available with model: {}", self.model);
                        Ok(true)
                    } else {
                        warn!(
                            "Ollama is running but model '{}' not found. Pull with: ollama pull {}",
                            self.model, self.model
                        );
                        Ok(false)
                    }
                } else {
                    info!("Ollama is available");
                    Ok(true)
                }
            }
            Ok(resp) => {
                warn!("Ollama API check failed: {}", resp.status());
                Ok(false)
            }
            Err(e) => {
                warn!("Ollama not available: {}. Start with: ollama serve", e);
                Ok(false)
            }
        }
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    num_ctx: usize,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    models: Vec<TagModel>,
}

#[derive(Debug, Deserialize)]
struct TagModel {
    name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let provider = OllamaProvider::new(&LlmConfig::default()).expect("provider");
        assert_eq!(provider.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(provider.model, DEFAULT_MODEL);
        assert_eq!(provider.name(), "ollama");
    }

    #[test]
    fn test_endpoint_scheme_validation() {
        let config = LlmConfig {
            endpoint: Some("ftp://localhost:11434".to_string()),
            ..Default::default()
        };
        assert!(OllamaProvider::new(&config).is_err());
    }

    #[test]
    fn test_endpoint_trailing_slash_stripped() {
        let config = LlmConfig {
            endpoint: Some("http://localhost:11434/".to_string()),
            ..Default::default()
        };
        let provider = OllamaProvider::new(&config).unwrap();
        assert_eq!(provider.endpoint, "http://localhost:11434");
    }

    #[test]
    fn test_request_shape() {
        let provider = OllamaProvider::new(&LlmConfig::default()).unwrap();
        let request = provider.build_request("summarize this");
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["model"], DEFAULT_MODEL);
        assert_eq!(json["prompt"], "summarize this");
        assert_eq!(json["stream"], false);
        assert!(json["options"]["num_ctx"].as_u64().unwrap() > 0);
    }
}

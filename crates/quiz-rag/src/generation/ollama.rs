//! Ollama HTTP client for embeddings and completions with retry logic

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;

use crate::config::LlmConfig;
use crate::error::{Error, Result, UpstreamService};

/// Ollama API client with automatic retry
pub struct OllamaClient {
    /// HTTP client
    client: Client,
    /// Configuration
    config: LlmConfig,
    /// Maximum retries
    max_retries: u32,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'static str>,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

impl OllamaClient {
    /// Create a new Ollama client with retry support
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(5)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            max_retries: config.max_retries,
            config: config.clone(),
        })
    }

    /// Client configuration
    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    /// Retry a request with exponential backoff.
    ///
    /// Only unreachable and timed-out requests are retried; a malformed
    /// answer is returned immediately.
    async fn retry_request<F, Fut, T>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    let delay = Duration::from_secs(2u64.pow(attempt));
                    tracing::warn!(
                        "Request failed (attempt {}/{}): {}, retrying in {:?}",
                        attempt + 1,
                        self.max_retries + 1,
                        e,
                        delay
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Check if Ollama is available
    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.config.base_url);

        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    /// Embed a text with the configured embedding model
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.config.base_url);
        let url = url.as_str();
        let service = UpstreamService::Embedding;

        self.retry_request(|| async move {
            let request = EmbedRequest {
                model: &self.config.embed_model,
                prompt: text,
            };

            let response = self
                .client
                .post(url)
                .json(&request)
                .send()
                .await
                .map_err(|e| self.classify(service, e))?;
            let response = check_status(service, response).await?;

            let embed_response: EmbedResponse = response.json().await.map_err(|e| {
                Error::upstream_response(service, format!("unexpected embedding body: {}", e))
            })?;

            if embed_response.embedding.is_empty() {
                return Err(Error::upstream_response(service, "empty embedding vector"));
            }
            Ok(embed_response.embedding)
        })
        .await
    }

    /// Run a completion with the configured generation model
    pub async fn complete(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.config.base_url);
        let url = url.as_str();
        let service = UpstreamService::Completion;

        tracing::info!("Generating with model: {}", self.config.generate_model);

        self.retry_request(|| async move {
            let request = GenerateRequest {
                model: &self.config.generate_model,
                prompt,
                stream: false,
                format: self.config.json_mode.then_some("json"),
                options: GenerateOptions {
                    temperature: self.config.temperature,
                },
            };

            let response = self
                .client
                .post(url)
                .json(&request)
                .send()
                .await
                .map_err(|e| self.classify(service, e))?;
            let response = check_status(service, response).await?;

            let generate_response: GenerateResponse = response.json().await.map_err(|e| {
                Error::upstream_response(service, format!("unexpected completion body: {}", e))
            })?;

            Ok(generate_response.response)
        })
        .await
    }

    /// Map a transport error onto the upstream error kinds
    fn classify(&self, service: UpstreamService, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::UpstreamTimeout {
                service,
                timeout_secs: self.config.timeout_secs,
            }
        } else if err.is_connect() || err.is_request() {
            Error::UpstreamUnavailable {
                service,
                message: err.to_string(),
            }
        } else {
            Error::upstream_response(service, err.to_string())
        }
    }
}

/// Turn non-success statuses into errors. 5xx counts as unavailable.
async fn check_status(
    service: UpstreamService,
    response: reqwest::Response,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = format!("HTTP {} - {}", status, body.trim());
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        Err(Error::UpstreamUnavailable { service, message })
    } else {
        Err(Error::upstream_response(service, message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_config() -> LlmConfig {
        LlmConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            timeout_secs: 2,
            max_retries: 0,
            ..LlmConfig::default()
        }
    }

    #[tokio::test]
    async fn test_unreachable_server_is_unavailable() {
        let client = OllamaClient::new(&unreachable_config()).unwrap();

        let err = client.embed("hello").await.unwrap_err();
        assert!(matches!(
            err,
            Error::UpstreamUnavailable {
                service: UpstreamService::Embedding,
                ..
            }
        ));

        let err = client.complete("hello").await.unwrap_err();
        assert_eq!(err.stage(), "completion");
        assert!(!client.health_check().await.unwrap());
    }

    #[tokio::test]
    async fn test_silent_server_is_timeout() {
        // Accepts connections and never answers
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        });

        let config = LlmConfig {
            base_url: format!("http://{}", addr),
            timeout_secs: 1,
            max_retries: 0,
            ..LlmConfig::default()
        };
        let client = OllamaClient::new(&config).unwrap();

        let err = client.complete("hello").await.unwrap_err();
        assert!(matches!(
            err,
            Error::UpstreamTimeout {
                service: UpstreamService::Completion,
                timeout_secs: 1
            }
        ));
        assert_eq!(err.status_code(), StatusCode::GATEWAY_TIMEOUT);
        assert!(err.is_retryable());

        let err = client.embed("hello").await.unwrap_err();
        assert!(matches!(err, Error::UpstreamTimeout { .. }));
    }

    #[test]
    fn test_generate_request_format() {
        let request = GenerateRequest {
            model: "mistral",
            prompt: "hi",
            stream: false,
            format: Some("json"),
            options: GenerateOptions { temperature: 0.3 },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["format"], "json");
        assert_eq!(json["stream"], false);

        let request = GenerateRequest { format: None, ..request };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("format").is_none());
    }
}

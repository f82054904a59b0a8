//! HTTP Completion Provider
//!
//! Talks to a chat-completion style HTTP API. The provider owns its own
//! timeout policy; retry classification lives in [`crate::RetryPolicy`], so
//! a failed call surfaces immediately with its status code and body intact.
//!
//! # Examples
//!
//! ```no_run
//! use crucible_llm::HttpCompletionProvider;
//!
//! let provider = HttpCompletionProvider::new("http://localhost:11434", "llama2");
//! // Note: the underlying call is async; the CompletionProvider trait impl
//! // wraps it for blocking callers
//! ```

use crate::LlmError;
use crucible_domain::traits::{CompletionProvider, CompletionRequest, CompletionResponse};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default API endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Default timeout for completion requests (30 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// HTTP completion API provider
pub struct HttpCompletionProvider {
    endpoint: String,
    model: String,
    client: reqwest::Client,
}

/// Request body for the completion API
#[derive(Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    system: &'a str,
    prompt: &'a str,
    max_tokens: u32,
    temperature: f64,
    stream: bool,
}

/// Response from the completion API
#[derive(Deserialize)]
struct ApiResponse {
    content: String,
    #[serde(default)]
    total_tokens: u32,
}

impl HttpCompletionProvider {
    /// Create a new provider
    ///
    /// # Parameters
    ///
    /// - `endpoint`: API endpoint (e.g., "http://localhost:11434")
    /// - `model`: Model to use
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .unwrap();

        Self {
            endpoint: endpoint.into(),
            model: model.into(),
            client,
        }
    }

    /// Create a provider against the default endpoint
    pub fn default_endpoint(model: impl Into<String>) -> Self {
        Self::new(DEFAULT_ENDPOINT, model)
    }

    /// Run one completion against the API
    ///
    /// # Errors
    ///
    /// - `LlmError::Timeout` when the request deadline elapses
    /// - `LlmError::ModelNotAvailable` on a 404
    /// - `LlmError::Http` for any other non-success status, carrying the
    ///   status code and parsed body for retry classification
    /// - `LlmError::InvalidResponse` when the body cannot be parsed
    pub async fn complete_async(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, LlmError> {
        let url = format!("{}/api/complete", self.endpoint);

        let body = ApiRequest {
            model: &self.model,
            system: &request.system_prompt,
            prompt: &request.user_prompt,
            max_tokens: request.max_output_tokens,
            temperature: request.temperature,
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout(format!("Request timed out: {}", e))
                } else {
                    LlmError::Communication(format!("Request failed: {}", e))
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(LlmError::ModelNotAvailable(self.model.clone()));
        }
        if !status.is_success() {
            let body = response.json::<serde_json::Value>().await.ok();
            return Err(LlmError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let parsed = response
            .json::<ApiResponse>()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        Ok(CompletionResponse {
            content: parsed.content,
            total_tokens: parsed.total_tokens,
        })
    }
}

impl CompletionProvider for HttpCompletionProvider {
    type Error = LlmError;

    fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, Self::Error> {
        // Blocking wrapper for async callers at the governance-cycle boundary
        tokio::runtime::Runtime::new()
            .map_err(|e| LlmError::Other(format!("Runtime error: {}", e)))?
            .block_on(self.complete_async(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_creation() {
        let provider = HttpCompletionProvider::new("http://localhost:11434", "llama2");
        assert_eq!(provider.endpoint, "http://localhost:11434");
        assert_eq!(provider.model, "llama2");
    }

    #[test]
    fn test_default_endpoint() {
        let provider = HttpCompletionProvider::default_endpoint("mistral");
        assert_eq!(provider.endpoint, DEFAULT_ENDPOINT);
    }

    #[tokio::test]
    async fn test_connection_error_handling() {
        // Unroutable endpoint triggers a communication error, not a panic
        let provider = HttpCompletionProvider::new("http://127.0.0.1:1", "llama2");
        let request = CompletionRequest::extraction("sys", "test");

        let result = provider.complete_async(&request).await;
        assert!(matches!(
            result,
            Err(LlmError::Communication(_)) | Err(LlmError::Timeout(_))
        ));
    }
}

//! Crucible LLM Provider Layer
//!
//! Pluggable completion provider implementations.
//!
//! # Architecture
//!
//! This crate provides implementations of the `CompletionProvider` trait from
//! `crucible-domain`, plus the retry policy that classifies provider failures
//! as transient or fatal. Providers never retry internally; callers wrap
//! calls with [`RetryPolicy`].
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic mock for testing
//! - `HttpCompletionProvider`: HTTP completion API integration
//!
//! # Examples
//!
//! ```
//! use crucible_llm::MockProvider;
//! use crucible_domain::traits::{CompletionProvider, CompletionRequest};
//!
//! let provider = MockProvider::new("Hello from LLM!");
//! let request = CompletionRequest::extraction("system", "test prompt");
//! let result = provider.complete(&request).unwrap();
//! assert_eq!(result.content, "Hello from LLM!");
//! ```

#![warn(missing_docs)]

pub mod http;
pub mod retry;

use crucible_domain::traits::{CompletionProvider, CompletionRequest, CompletionResponse};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use thiserror::Error;

pub use http::HttpCompletionProvider;
pub use retry::RetryPolicy;

/// Errors that can occur during completion operations
///
/// HTTP failures carry the status code and, when the server returned a
/// structured body, the parsed body. Both are consumed only by
/// [`RetryPolicy`] for transient-vs-fatal classification.
#[derive(Error, Debug)]
pub enum LlmError {
    /// HTTP-level failure with status code and optional structured body
    #[error("HTTP {status} from completion API")]
    Http {
        /// Response status code
        status: u16,
        /// Parsed response body, when the server sent JSON
        body: Option<serde_json::Value>,
    },

    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// The call exceeded its deadline
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Invalid response from the provider
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

impl LlmError {
    /// The HTTP status code, if this failure carries one
    pub fn status_code(&self) -> Option<u16> {
        match self {
            LlmError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The structured `error.type` field from the response body, if present
    pub fn body_error_type(&self) -> Option<&str> {
        let LlmError::Http { body: Some(body), .. } = self else {
            return None;
        };
        body.get("error")
            .and_then(|e| e.get("type"))
            .or_else(|| body.get("type"))
            .and_then(|t| t.as_str())
    }
}

/// One scripted outcome for the mock provider
#[derive(Debug, Clone)]
enum MockOutcome {
    Content(String),
    HttpFailure(u16),
}

/// Mock completion provider for deterministic testing
///
/// Returns pre-configured responses without making any network calls.
/// Responses can be keyed by user prompt, or scripted as an ordered queue of
/// outcomes (useful for exercising retry behavior).
///
/// # Examples
///
/// ```
/// use crucible_llm::MockProvider;
/// use crucible_domain::traits::{CompletionProvider, CompletionRequest};
///
/// let mut provider = MockProvider::new("fallback");
/// provider.add_response("prompt1", "response1");
///
/// let req = CompletionRequest::extraction("sys", "prompt1");
/// assert_eq!(provider.complete(&req).unwrap().content, "response1");
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    responses: Arc<Mutex<HashMap<String, String>>>,
    script: Arc<Mutex<VecDeque<MockOutcome>>>,
    call_count: Arc<Mutex<usize>>,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            responses: Arc::new(Mutex::new(HashMap::new())),
            script: Arc::new(Mutex::new(VecDeque::new())),
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Add a specific response for a given user prompt
    pub fn add_response(&mut self, prompt: impl Into<String>, response: impl Into<String>) {
        self.responses
            .lock()
            .unwrap()
            .insert(prompt.into(), response.into());
    }

    /// Queue a scripted successful response, consumed before prompt lookup
    pub fn script_content(&mut self, content: impl Into<String>) {
        self.script
            .lock()
            .unwrap()
            .push_back(MockOutcome::Content(content.into()));
    }

    /// Queue a scripted HTTP failure with the given status code
    pub fn script_http_failure(&mut self, status: u16) {
        self.script
            .lock()
            .unwrap()
            .push_back(MockOutcome::HttpFailure(status));
    }

    /// Get the number of times complete was called
    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    /// Reset the call count
    pub fn reset_call_count(&self) {
        *self.call_count.lock().unwrap() = 0;
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

impl CompletionProvider for MockProvider {
    type Error = LlmError;

    fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, Self::Error> {
        *self.call_count.lock().unwrap() += 1;

        // Scripted outcomes win over keyed responses
        if let Some(outcome) = self.script.lock().unwrap().pop_front() {
            return match outcome {
                MockOutcome::Content(content) => Ok(CompletionResponse {
                    total_tokens: (content.len() / 4) as u32,
                    content,
                }),
                MockOutcome::HttpFailure(status) => Err(LlmError::Http { status, body: None }),
            };
        }

        let responses = self.responses.lock().unwrap();
        let content = responses
            .get(&request.user_prompt)
            .cloned()
            .unwrap_or_else(|| self.default_response.clone());

        Ok(CompletionResponse {
            total_tokens: (content.len() / 4) as u32,
            content,
        })
    }
}

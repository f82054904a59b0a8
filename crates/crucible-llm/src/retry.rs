//! Retry policy for the completion boundary
//!
//! Classifies provider failures as transient (retry with backoff) or fatal
//! (surface immediately). Providers never retry internally; callers wrap
//! every external call with this policy and treat exhaustion of retries as a
//! fatal error for that call, not for the whole cycle.

use crate::LlmError;
use crucible_domain::traits::{CompletionProvider, CompletionRequest, CompletionResponse};
use std::thread;
use std::time::Duration;
use tracing::warn;

/// Structured error types that always signal a transient condition
const TRANSIENT_ERROR_TYPES: [&str; 3] =
    ["overloaded_error", "rate_limit_error", "timeout_error"];

/// Message fragments that signal a transient condition
const TRANSIENT_MESSAGE_SIGNALS: [&str; 4] = ["overloaded", "rate limit", "rate_limit", "timeout"];

/// Bounded retry with a fixed backoff schedule
///
/// # Classification
///
/// Retriable: status codes 429, 500, 502, 503, 504, and the 520-529 server
/// overload band; structured `error.type` values of `overloaded_error`,
/// `rate_limit_error`, or `timeout_error`; and rate-limit / timeout /
/// overloaded message signals. Non-retriable: 400, 401, and 403, regardless
/// of message content.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    backoff: Vec<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff: vec![
                Duration::from_secs(5),
                Duration::from_secs(15),
                Duration::from_secs(45),
            ],
        }
    }
}

impl RetryPolicy {
    /// Create a policy with an explicit retry count and backoff schedule
    ///
    /// When the schedule is shorter than the retry count, the last entry
    /// repeats.
    pub fn new(max_retries: u32, backoff: Vec<Duration>) -> Self {
        Self { max_retries, backoff }
    }

    /// A policy that retries without sleeping (for tests)
    pub fn no_backoff(max_retries: u32) -> Self {
        Self {
            max_retries,
            backoff: Vec::new(),
        }
    }

    /// Whether the given failure is transient
    pub fn should_retry(&self, error: &LlmError) -> bool {
        if let Some(status) = error.status_code() {
            // Authentication/authorization and malformed-request failures
            // surface immediately, whatever the message says
            if matches!(status, 400 | 401 | 403) {
                return false;
            }
            if matches!(status, 429 | 500 | 502 | 503 | 504) || (520..=529).contains(&status) {
                return true;
            }
        }

        if matches!(error, LlmError::Timeout(_) | LlmError::RateLimitExceeded) {
            return true;
        }

        if let Some(kind) = error.body_error_type() {
            if TRANSIENT_ERROR_TYPES.contains(&kind) {
                return true;
            }
        }

        let message = error.to_string().to_lowercase();
        TRANSIENT_MESSAGE_SIGNALS
            .iter()
            .any(|signal| message.contains(signal))
    }

    /// Run an operation, retrying transient failures up to the bound
    ///
    /// Calls are blocking; backoff sleeps on the calling thread.
    pub fn execute<T, F>(&self, mut op: F) -> Result<T, LlmError>
    where
        F: FnMut() -> Result<T, LlmError>,
    {
        let mut attempt: u32 = 0;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(error) => {
                    if attempt >= self.max_retries || !self.should_retry(&error) {
                        return Err(error);
                    }
                    let wait = self
                        .backoff
                        .get(attempt as usize)
                        .or_else(|| self.backoff.last())
                        .copied()
                        .unwrap_or(Duration::ZERO);
                    warn!(
                        attempt = attempt + 1,
                        max = self.max_retries,
                        error = %error,
                        "transient completion failure, retrying"
                    );
                    if !wait.is_zero() {
                        thread::sleep(wait);
                    }
                    attempt += 1;
                }
            }
        }
    }

    /// Run one completion through a provider with retry
    pub fn complete<P>(
        &self,
        provider: &P,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, LlmError>
    where
        P: CompletionProvider<Error = LlmError>,
    {
        self.execute(|| provider.complete(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockProvider;

    fn http(status: u16) -> LlmError {
        LlmError::Http { status, body: None }
    }

    #[test]
    fn test_server_band_is_retriable() {
        let policy = RetryPolicy::default();
        for status in [429, 500, 502, 503, 504, 520, 524, 529] {
            assert!(policy.should_retry(&http(status)), "status {}", status);
        }
    }

    #[test]
    fn test_client_failures_are_fatal() {
        let policy = RetryPolicy::default();
        for status in [400, 401, 403] {
            assert!(!policy.should_retry(&http(status)), "status {}", status);
        }
    }

    #[test]
    fn test_fatal_status_wins_over_message() {
        // A 401 whose body mentions a timeout is still fatal
        let policy = RetryPolicy::default();
        let error = LlmError::Http {
            status: 401,
            body: Some(serde_json::json!({"error": {"type": "timeout_error"}})),
        };
        assert!(!policy.should_retry(&error));
    }

    #[test]
    fn test_structured_overloaded_error_is_retriable() {
        let policy = RetryPolicy::default();
        let error = LlmError::Http {
            status: 418,
            body: Some(serde_json::json!({"error": {"type": "overloaded_error"}})),
        };
        assert!(policy.should_retry(&error));
    }

    #[test]
    fn test_message_signals_are_retriable() {
        let policy = RetryPolicy::default();
        assert!(policy.should_retry(&LlmError::Communication(
            "server overloaded, try later".to_string()
        )));
        assert!(policy.should_retry(&LlmError::Other("rate limit hit".to_string())));
        assert!(policy.should_retry(&LlmError::Timeout("30s elapsed".to_string())));
        assert!(policy.should_retry(&LlmError::RateLimitExceeded));
    }

    #[test]
    fn test_plain_failures_are_fatal() {
        let policy = RetryPolicy::default();
        assert!(!policy.should_retry(&LlmError::InvalidResponse("bad JSON".to_string())));
        assert!(!policy.should_retry(&LlmError::Other("model refused".to_string())));
    }

    #[test]
    fn test_execute_recovers_after_transient_failures() {
        let mut provider = MockProvider::new("unused");
        provider.script_http_failure(503);
        provider.script_http_failure(529);
        provider.script_content("recovered");

        let policy = RetryPolicy::no_backoff(3);
        let request = CompletionRequest::extraction("sys", "prompt");
        let response = policy.complete(&provider, &request).unwrap();

        assert_eq!(response.content, "recovered");
        assert_eq!(provider.call_count(), 3);
    }

    #[test]
    fn test_execute_surfaces_fatal_immediately() {
        let mut provider = MockProvider::new("unused");
        provider.script_http_failure(401);

        let policy = RetryPolicy::no_backoff(3);
        let request = CompletionRequest::extraction("sys", "prompt");
        let result = policy.complete(&provider, &request);

        assert!(matches!(result, Err(LlmError::Http { status: 401, .. })));
        assert_eq!(provider.call_count(), 1);
    }

    #[test]
    fn test_execute_bounded_exhaustion() {
        let mut provider = MockProvider::new("unused");
        for _ in 0..5 {
            provider.script_http_failure(503);
        }

        let policy = RetryPolicy::no_backoff(2);
        let request = CompletionRequest::extraction("sys", "prompt");
        let result = policy.complete(&provider, &request);

        // Initial attempt plus two retries, then the last error surfaces
        assert!(matches!(result, Err(LlmError::Http { status: 503, .. })));
        assert_eq!(provider.call_count(), 3);
    }
}

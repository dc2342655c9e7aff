//! AI module type definitions
//!
//! Error types and request tuning constants shared by the text generation
//! client and the advisor pipeline.

use serde::Serialize;
use std::time::Duration;

// ============================================================================
// Request Configuration Constants
// ============================================================================

/// Request timeout in seconds
pub const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Maximum retries for transient errors
pub const MAX_RETRIES: u32 = 2;

/// Base delay for exponential backoff (milliseconds)
pub const RETRY_BASE_DELAY_MS: u64 = 1000;

/// Upper bound for a single backoff delay (milliseconds)
pub const RETRY_MAX_DELAY_MS: u64 = 10_000;

/// Default sampling temperature for advice generation
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Default model for advice generation
pub const DEFAULT_MODEL: &str = "gemini-flash-latest";

// ============================================================================
// Structured AI Errors
// ============================================================================

/// Types of AI API errors
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AiErrorKind {
    /// Rate limit exceeded - too many requests, retry after delay
    RateLimit,
    /// Quota/credits exhausted
    QuotaExceeded,
    /// Invalid or expired API key
    InvalidApiKey,
    /// Model not found or not available
    ModelNotFound,
    /// Server error on provider side
    ServerError,
    /// Network/connection error
    NetworkError,
    /// Request did not finish within the configured timeout
    Timeout,
    /// Provider answered, but without usable text
    EmptyResponse,
    /// Other/unknown error
    Other,
}

/// Structured AI error with details
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AiError {
    pub kind: AiErrorKind,
    pub message: String,
    pub provider: String,
    pub model: String,
    /// Suggested retry delay in seconds (for rate limit errors)
    pub retry_after_secs: Option<u32>,
}

impl AiError {
    fn new(kind: AiErrorKind, provider: &str, model: &str, message: String) -> Self {
        Self {
            kind,
            message,
            provider: provider.to_string(),
            model: model.to_string(),
            retry_after_secs: None,
        }
    }

    pub fn rate_limit(provider: &str, model: &str, retry_after: Option<u32>) -> Self {
        Self {
            retry_after_secs: retry_after,
            ..Self::new(
                AiErrorKind::RateLimit,
                provider,
                model,
                "Too many requests, please wait a moment.".to_string(),
            )
        }
    }

    pub fn quota_exceeded(provider: &str, model: &str) -> Self {
        Self::new(
            AiErrorKind::QuotaExceeded,
            provider,
            model,
            "Quota exhausted for this API key.".to_string(),
        )
    }

    pub fn invalid_api_key(provider: &str, model: &str) -> Self {
        Self::new(
            AiErrorKind::InvalidApiKey,
            provider,
            model,
            "Invalid API key.".to_string(),
        )
    }

    pub fn model_not_found(provider: &str, model: &str) -> Self {
        Self::new(
            AiErrorKind::ModelNotFound,
            provider,
            model,
            format!("Model '{}' is not available.", model),
        )
    }

    pub fn server_error(provider: &str, model: &str, details: &str) -> Self {
        Self {
            retry_after_secs: Some(5),
            ..Self::new(
                AiErrorKind::ServerError,
                provider,
                model,
                format!("Server error at {}: {}", provider, details),
            )
        }
    }

    pub fn network_error(provider: &str, model: &str, details: &str) -> Self {
        Self {
            retry_after_secs: Some(3),
            ..Self::new(
                AiErrorKind::NetworkError,
                provider,
                model,
                format!("Network error: {}", details),
            )
        }
    }

    pub fn timeout(provider: &str, model: &str, after: Duration) -> Self {
        Self::new(
            AiErrorKind::Timeout,
            provider,
            model,
            format!("{} did not respond within {}s", provider, after.as_secs()),
        )
    }

    pub fn empty_response(provider: &str, model: &str) -> Self {
        Self::new(
            AiErrorKind::EmptyResponse,
            provider,
            model,
            format!("{} returned no text", provider),
        )
    }

    pub fn other(provider: &str, model: &str, message: &str) -> Self {
        Self::new(AiErrorKind::Other, provider, model, message.to_string())
    }

    /// Rate limits, provider-side errors, network failures and timeouts are
    /// worth another attempt. Everything else fails immediately.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind,
            AiErrorKind::RateLimit
                | AiErrorKind::ServerError
                | AiErrorKind::NetworkError
                | AiErrorKind::Timeout
        )
    }
}

impl std::fmt::Display for AiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AiError {}

/// Parse retry delay from error response (supports "4s", "4.5s", seconds as number)
pub fn parse_retry_delay(text: &str) -> Option<u32> {
    // Try to find "retryDelay": "Xs" pattern
    if let Some(idx) = text.find("retryDelay") {
        let after = &text[idx + "retryDelay".len()..];
        for word in after.split_whitespace().take(5) {
            let clean = word.trim_matches(|c: char| !c.is_numeric() && c != '.');
            if let Ok(secs) = clean.parse::<f64>() {
                return Some(secs.ceil() as u32);
            }
        }
    }
    // Try to find "retry in X" pattern
    if let Some(idx) = text.find("retry in") {
        let after = &text[idx + "retry in".len()..];
        for word in after.split_whitespace().take(3) {
            let clean = word.trim_matches(|c: char| !c.is_numeric() && c != '.');
            if let Ok(secs) = clean.parse::<f64>() {
                return Some(secs.ceil() as u32);
            }
        }
    }
    None
}

/// Calculate exponential backoff delay for the given (zero-based) retry
pub fn calculate_backoff_delay(base: Duration, attempt: u32) -> Duration {
    let factor = 2u32.saturating_pow(attempt);
    base.saturating_mul(factor)
        .min(Duration::from_millis(RETRY_MAX_DELAY_MS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_retry_delay_from_gemini_body() {
        let body = r#"{"error": {"details": [{"retryDelay": "4.2s"}]}}"#;
        assert_eq!(parse_retry_delay(body), Some(5));
    }

    #[test]
    fn test_parse_retry_delay_from_message() {
        assert_eq!(parse_retry_delay("Please retry in 12 seconds"), Some(12));
        assert_eq!(parse_retry_delay("quota exceeded"), None);
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let base = Duration::from_millis(RETRY_BASE_DELAY_MS);
        assert_eq!(calculate_backoff_delay(base, 0), Duration::from_millis(1000));
        assert_eq!(calculate_backoff_delay(base, 1), Duration::from_millis(2000));
        assert_eq!(calculate_backoff_delay(base, 2), Duration::from_millis(4000));
        assert_eq!(calculate_backoff_delay(base, 10), Duration::from_millis(RETRY_MAX_DELAY_MS));
    }

    #[test]
    fn test_retryable_kinds() {
        assert!(AiError::rate_limit("Gemini", "m", None).is_retryable());
        assert!(AiError::server_error("Gemini", "m", "HTTP 503").is_retryable());
        assert!(AiError::timeout("Gemini", "m", Duration::from_secs(1)).is_retryable());
        assert!(!AiError::invalid_api_key("Gemini", "m").is_retryable());
        assert!(!AiError::quota_exceeded("Gemini", "m").is_retryable());
        assert!(!AiError::empty_response("Gemini", "m").is_retryable());
    }
}

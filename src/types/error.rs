//! Unified Error Type System
//!
//! Centralized error types for the entire application.
//! Provides error classification for retry decisions on provider calls.
//!
//! ## Error Taxonomy
//!
//! - **Parse**: malformed input, reported per file with position, never aborts a batch
//! - **Analysis**: non-fatal, one element degrades to unknown metrics
//! - **Provider**: retryable (rate-limit, network, transient) or terminal (auth, token-limit)
//! - **Insertion**: no safe insertion point, fails that element/file only
//!
//! Internal component failures never leak as raw lower-level errors; each
//! component translates into one of the variants below before returning.

use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DocError>;

// =============================================================================
// Error Categories
// =============================================================================

/// Provider failure categories for retry decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Rate limited - wait then retry
    RateLimit,
    /// Context/token limit exceeded - fail the element immediately
    TokenLimit,
    /// Authentication failed - fail fast, don't retry
    Auth,
    /// Network/connectivity issues - retry with backoff
    Network,
    /// Temporary server issues - retry
    Transient,
    /// Invalid request - don't retry, fix request
    BadRequest,
    /// Unknown error - conservative retry
    Unknown,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RateLimit => write!(f, "rate-limit"),
            Self::TokenLimit => write!(f, "token-limit"),
            Self::Auth => write!(f, "authentication"),
            Self::Network => write!(f, "network"),
            Self::Transient => write!(f, "transient"),
            Self::BadRequest => write!(f, "bad-request"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

impl ErrorCategory {
    /// Check if this category is retryable with backoff
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimit | Self::Network | Self::Transient | Self::Unknown
        )
    }

    /// Get recommended retry delay for this category
    pub fn recommended_delay(&self) -> Duration {
        match self {
            Self::RateLimit => Duration::from_secs(30),
            Self::Network => Duration::from_secs(5),
            Self::Transient => Duration::from_secs(2),
            _ => Duration::from_millis(500),
        }
    }
}

// =============================================================================
// Provider Error
// =============================================================================

/// Provider error with category, context, and retry hints
#[derive(Debug, Clone)]
pub struct ProviderError {
    /// Error category for retry decisions
    pub category: ErrorCategory,
    /// Detailed error message
    pub message: String,
    /// Provider that produced the error
    pub provider: Option<String>,
    /// Suggested wait time before retry (if applicable)
    pub retry_after: Option<Duration>,
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(provider) = &self.provider {
            write!(f, "[{}:{}] {}", provider, self.category, self.message)
        } else {
            write!(f, "[{}] {}", self.category, self.message)
        }
    }
}

impl std::error::Error for ProviderError {}

impl ProviderError {
    /// Create a new provider error
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            provider: None,
            retry_after: None,
        }
    }

    /// Create error with provider context
    pub fn with_provider(
        category: ErrorCategory,
        message: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            category,
            message: message.into(),
            provider: Some(provider.into()),
            retry_after: None,
        }
    }

    /// Add suggested retry delay
    pub fn retry_after(mut self, duration: Duration) -> Self {
        self.retry_after = Some(duration);
        self
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        self.category.is_retryable()
    }

    /// Get recommended retry delay
    pub fn recommended_delay(&self) -> Duration {
        self.retry_after
            .unwrap_or_else(|| self.category.recommended_delay())
    }
}

// =============================================================================
// Error Classifier
// =============================================================================

/// Classifies raw provider failures into the taxonomy
pub struct ErrorClassifier;

impl ErrorClassifier {
    /// Classify an error message from any provider
    pub fn classify(message: &str, provider: &str) -> ProviderError {
        let lower = message.to_lowercase();

        // Rate limiting patterns
        if lower.contains("rate limit")
            || lower.contains("429")
            || lower.contains("too many requests")
            || lower.contains("quota exceeded")
        {
            return ProviderError::with_provider(ErrorCategory::RateLimit, message, provider)
                .retry_after(Duration::from_secs(30));
        }

        // Token/context limit patterns
        if lower.contains("token") && (lower.contains("limit") || lower.contains("exceed"))
            || lower.contains("context length")
            || lower.contains("context too long")
        {
            return ProviderError::with_provider(ErrorCategory::TokenLimit, message, provider);
        }

        // Authentication patterns
        if lower.contains("auth")
            || lower.contains("401")
            || lower.contains("403")
            || lower.contains("api key")
            || lower.contains("invalid key")
            || lower.contains("unauthorized")
            || lower.contains("permission denied")
        {
            return ProviderError::with_provider(ErrorCategory::Auth, message, provider);
        }

        // Network patterns
        if lower.contains("network")
            || lower.contains("connection")
            || lower.contains("dns")
            || lower.contains("timeout")
            || lower.contains("timed out")
            || lower.contains("unreachable")
        {
            return ProviderError::with_provider(ErrorCategory::Network, message, provider)
                .retry_after(Duration::from_secs(5));
        }

        // Bad request patterns
        if lower.contains("400") || lower.contains("bad request") || lower.contains("malformed") {
            return ProviderError::with_provider(ErrorCategory::BadRequest, message, provider);
        }

        // Transient patterns (server-side issues that may resolve)
        if lower.contains("retry")
            || lower.contains("temporary")
            || lower.contains("overloaded")
            || lower.contains("503")
            || lower.contains("502")
            || lower.contains("500")
            || lower.contains("server error")
        {
            return ProviderError::with_provider(ErrorCategory::Transient, message, provider)
                .retry_after(Duration::from_secs(2));
        }

        ProviderError::with_provider(ErrorCategory::Unknown, message, provider)
    }

    /// Classify HTTP status code directly (more accurate than string matching)
    pub fn classify_http_status(status: u16, message: &str, provider: &str) -> ProviderError {
        match status {
            429 => ProviderError::with_provider(ErrorCategory::RateLimit, message, provider)
                .retry_after(Duration::from_secs(30)),
            401 | 403 => ProviderError::with_provider(ErrorCategory::Auth, message, provider),
            400 | 404 | 422 => {
                ProviderError::with_provider(ErrorCategory::BadRequest, message, provider)
            }
            // 500 series are transient - can retry
            500 | 502 | 503 | 504 => {
                ProviderError::with_provider(ErrorCategory::Transient, message, provider)
                    .retry_after(Duration::from_secs(5))
            }
            _ => ProviderError::with_provider(ErrorCategory::Unknown, message, provider),
        }
    }
}

// =============================================================================
// Application Error
// =============================================================================

#[derive(Debug, Error)]
pub enum DocError {
    // -------------------------------------------------------------------------
    // System Errors (auto From impl)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // -------------------------------------------------------------------------
    // Domain Errors
    // -------------------------------------------------------------------------
    /// File-level failure before parsing could produce diagnostics
    /// (unreadable file, grammar initialization failure).
    #[error("Parse error in {path}: {message}")]
    Parse { path: String, message: String },

    /// One element's analysis failed; its metrics degrade to unknown.
    #[error("Analysis failed for {element}: {message}")]
    Analysis { element: String, message: String },

    /// Structured provider failure with retry classification
    #[error("Provider error: {0}")]
    Provider(ProviderError),

    /// No safe insertion point could be located; the file is left untouched.
    #[error("Cannot insert docstring for {element}: {reason}")]
    Insertion { element: String, reason: String },

    #[error("Operation timeout after {duration:?}: {operation}")]
    Timeout {
        operation: String,
        duration: Duration,
    },

    #[error("Config error: {0}")]
    Config(String),

    #[error("Generation canceled")]
    Canceled,
}

impl From<ProviderError> for DocError {
    fn from(err: ProviderError) -> Self {
        DocError::Provider(err)
    }
}

impl DocError {
    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        DocError::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Provider error category, if this is a provider failure
    pub fn provider_category(&self) -> Option<ErrorCategory> {
        match self {
            DocError::Provider(e) => Some(e.category),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_is_retryable() {
        let err = ErrorClassifier::classify("429 Too Many Requests", "openai");
        assert_eq!(err.category, ErrorCategory::RateLimit);
        assert!(err.is_retryable());
        assert_eq!(err.recommended_delay(), Duration::from_secs(30));
    }

    #[test]
    fn auth_fails_fast() {
        let err = ErrorClassifier::classify_http_status(401, "invalid api key", "openai");
        assert_eq!(err.category, ErrorCategory::Auth);
        assert!(!err.is_retryable());
    }

    #[test]
    fn token_limit_is_terminal() {
        let err = ErrorClassifier::classify("maximum context length exceeded", "openai");
        assert_eq!(err.category, ErrorCategory::TokenLimit);
        assert!(!err.is_retryable());
    }

    #[test]
    fn server_errors_are_transient() {
        let err = ErrorClassifier::classify_http_status(503, "service unavailable", "openai");
        assert_eq!(err.category, ErrorCategory::Transient);
        assert!(err.is_retryable());
    }

    #[test]
    fn display_includes_provider_and_category() {
        let err = ProviderError::with_provider(ErrorCategory::Auth, "denied", "openai");
        assert_eq!(err.to_string(), "[openai:authentication] denied");
    }
}

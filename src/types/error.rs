//! Unified Error Type System
//!
//! Centralized error types for the entire application.
//! Provides error classification for retry decisions.
//!
//! ## Error Categories
//!
//! - **ModelLoading**: local backend is still loading the model (retry on a
//!   longer, fixed timescale)
//! - **RateLimit**: API rate limiting (wait and retry)
//! - **Network**: connectivity or timeout issues (retry with backoff)
//! - **Transient**: temporary server-side issues (retry with backoff)
//! - **Auth**: authentication failures (fail fast)
//! - **BadRequest**: malformed requests (fail fast)
//!
//! ## Design Principles
//!
//! - Single unified error type (SyncError) for the entire application
//! - Category-based routing for retry decisions
//! - No panic/unwrap - all errors are recoverable

use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Error Categories
// =============================================================================

/// Unified error categories for retry decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Local backend reported the model is still loading
    ModelLoading,
    /// Rate limited - wait then retry
    RateLimit,
    /// Authentication failed - fail fast, don't retry
    Auth,
    /// Network/connectivity/timeout issues - retry with backoff
    Network,
    /// Invalid request - don't retry, fix request
    BadRequest,
    /// Temporary server issues - retry
    Transient,
    /// Unknown error - conservative retry
    Unknown,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ModelLoading => write!(f, "MODEL_LOADING"),
            Self::RateLimit => write!(f, "RATE_LIMIT"),
            Self::Auth => write!(f, "AUTH"),
            Self::Network => write!(f, "NETWORK"),
            Self::BadRequest => write!(f, "BAD_REQUEST"),
            Self::Transient => write!(f, "TRANSIENT"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

impl ErrorCategory {
    /// Check if this category is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ModelLoading
                | Self::RateLimit
                | Self::Network
                | Self::Transient
                | Self::Unknown
        )
    }
}

// =============================================================================
// LLM Error
// =============================================================================

/// Unified LLM error with category, context, and retry hints
#[derive(Debug, Clone)]
pub struct LlmError {
    /// Error category for retry decisions
    pub category: ErrorCategory,
    /// Detailed error message
    pub message: String,
    /// Backend that produced the error
    pub backend: Option<String>,
    /// Suggested wait time before retry (if the response carried one)
    pub retry_after: Option<Duration>,
}

impl std::fmt::Display for LlmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(backend) = &self.backend {
            write!(f, "[{}:{}] {}", backend, self.category, self.message)
        } else {
            write!(f, "[{}] {}", self.category, self.message)
        }
    }
}

impl std::error::Error for LlmError {}

impl LlmError {
    /// Create a new LLM error
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            backend: None,
            retry_after: None,
        }
    }

    /// Create error with backend context
    pub fn with_backend(
        category: ErrorCategory,
        message: impl Into<String>,
        backend: impl Into<String>,
    ) -> Self {
        Self {
            category,
            message: message.into(),
            backend: Some(backend.into()),
            retry_after: None,
        }
    }

    /// Add suggested retry delay
    pub fn retry_after(mut self, duration: Duration) -> Self {
        self.retry_after = Some(duration);
        self
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        self.category.is_retryable()
    }
}

// =============================================================================
// Error Classifier
// =============================================================================

/// Error classifier for retry routing
pub struct ErrorClassifier;

impl ErrorClassifier {
    /// Classify an HTTP status + response body from a backend.
    ///
    /// Status codes are authoritative; the body is consulted only to tell
    /// a model-loading 5xx apart from a generic server error.
    pub fn classify_http_status(status: u16, body: &str, backend: &str) -> LlmError {
        match status {
            429 => LlmError::with_backend(ErrorCategory::RateLimit, body_snippet(body), backend)
                .retry_after(parse_retry_after(body).unwrap_or(Duration::from_secs(
                    crate::constants::retry::RATE_LIMIT_DELAY_SECS,
                ))),
            401 | 403 => {
                LlmError::with_backend(ErrorCategory::Auth, body_snippet(body), backend)
            }
            408 => LlmError::with_backend(ErrorCategory::Network, body_snippet(body), backend),
            400..=499 => {
                LlmError::with_backend(ErrorCategory::BadRequest, body_snippet(body), backend)
            }
            500..=599 if is_model_loading(body) => {
                LlmError::with_backend(ErrorCategory::ModelLoading, body_snippet(body), backend)
            }
            500..=599 => {
                LlmError::with_backend(ErrorCategory::Transient, body_snippet(body), backend)
            }
            _ => LlmError::with_backend(ErrorCategory::Unknown, body_snippet(body), backend),
        }
    }

    /// Classify a transport-level failure from reqwest.
    pub fn classify_transport(err: &reqwest::Error, backend: &str) -> LlmError {
        if err.is_timeout() || err.is_connect() {
            LlmError::with_backend(ErrorCategory::Network, err.to_string(), backend)
        } else if err.is_decode() {
            LlmError::with_backend(ErrorCategory::Transient, err.to_string(), backend)
        } else {
            LlmError::with_backend(ErrorCategory::Unknown, err.to_string(), backend)
        }
    }
}

/// Detect the local daemon's "model is still loading" 5xx bodies.
fn is_model_loading(body: &str) -> bool {
    let lower = body.to_lowercase();
    lower.contains("loading model")
        || lower.contains("model is loading")
        || lower.contains("server finished loading")
}

/// Extract a retry-after hint from common rate-limit error bodies.
///
/// Matches "retry after N", "retry-after: N", "wait N seconds".
fn parse_retry_after(body: &str) -> Option<Duration> {
    let lower = body.to_lowercase();
    for pattern in &["retry after ", "retry-after: ", "retry-after:", "wait "] {
        if let Some(idx) = lower.find(pattern) {
            let rest = &lower[idx + pattern.len()..];
            for word in rest.split_whitespace() {
                let trimmed = word.trim_matches(|c: char| !c.is_ascii_digit());
                if let Ok(secs) = trimmed.parse::<u64>() {
                    return Some(Duration::from_secs(secs.min(300)));
                }
            }
        }
    }
    None
}

/// Keep error messages log-friendly.
fn body_snippet(body: &str) -> String {
    const MAX: usize = 300;
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "(empty response body)".to_string();
    }
    let mut snippet: String = trimmed.chars().take(MAX).collect();
    if trimmed.chars().count() > MAX {
        snippet.push_str("...");
    }
    snippet
}

// =============================================================================
// Application Error
// =============================================================================

#[derive(Debug, Error)]
pub enum SyncError {
    // -------------------------------------------------------------------------
    // System Errors (auto From impl)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // -------------------------------------------------------------------------
    // LLM Errors
    // -------------------------------------------------------------------------
    /// Structured generation error with category and retry hints
    #[error("generation error: {0}")]
    Llm(LlmError),

    // -------------------------------------------------------------------------
    // Domain Errors
    // -------------------------------------------------------------------------
    #[error("parse error in {path}: {message}")]
    Parse { message: String, path: String },

    #[error("documentation file {path}: {message}")]
    Injection { path: String, message: String },

    #[error("config error: {0}")]
    Config(String),
}

impl From<LlmError> for SyncError {
    fn from(err: LlmError) -> Self {
        SyncError::Llm(err)
    }
}

impl SyncError {
    /// Create an injection error for a documentation file path
    pub fn injection(path: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Injection {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;

// =============================================================================
// Tests
// =============================================================================

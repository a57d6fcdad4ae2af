//! Error types for the Instagram publishing tools
//!
//! Every provider-facing failure is an [`ApiError`] tagged with one
//! [`ApiErrorKind`] from a closed taxonomy. [`InstagramError`] widens that
//! with the configuration and local I/O failures of the surrounding service.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for Instagram operations
pub type Result<T> = std::result::Result<T, InstagramError>;

/// Closed set of error kinds surfaced to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiErrorKind {
    /// Access token has expired (provider code 190)
    ExpiredToken,
    /// Access token was rejected or could not be obtained
    InvalidToken,
    /// Token lacks a required permission (provider codes 100, 200)
    InsufficientScope,
    /// Provider throttled the caller (provider codes 4, 17)
    RateLimit,
    /// Request was rejected locally or by the provider
    InvalidRequest,
    /// Transport failure or non-success HTTP status without a provider body
    NetworkError,
    /// Anything else, including processing timeouts
    UnknownError,
}

impl ApiErrorKind {
    /// Wire name of the kind
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExpiredToken => "EXPIRED_TOKEN",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::InsufficientScope => "INSUFFICIENT_SCOPE",
            Self::RateLimit => "RATE_LIMIT",
            Self::InvalidRequest => "INVALID_REQUEST",
            Self::NetworkError => "NETWORK_ERROR",
            Self::UnknownError => "UNKNOWN_ERROR",
        }
    }

    /// Whether retrying the same call later may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimit | Self::NetworkError)
    }

    /// Whether the account owner has to authorize again
    pub fn requires_reauth(&self) -> bool {
        matches!(
            self,
            Self::ExpiredToken | Self::InvalidToken | Self::InsufficientScope
        )
    }
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified provider or validation failure
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ApiError {
    /// Error kind
    pub kind: ApiErrorKind,
    /// Human-readable message (provider message verbatim when available)
    pub message: String,
    /// HTTP status of the failing response, if any
    pub http_status: Option<u16>,
    /// Provider trace id (`fbtrace_id`), if any
    pub trace_id: Option<String>,
    /// Underlying cause
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ApiError {
    /// Create an error of the given kind
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            http_status: None,
            trace_id: None,
            source: None,
        }
    }

    /// Shorthand for a local or provider-side `INVALID_REQUEST`
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::InvalidRequest, message)
    }

    /// Shorthand for `UNKNOWN_ERROR`
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::UnknownError, message)
    }

    /// Attach the HTTP status (builder pattern)
    pub fn with_status(mut self, status: u16) -> Self {
        self.http_status = Some(status);
        self
    }

    /// Attach the provider trace id (builder pattern)
    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    /// Attach the underlying cause (builder pattern)
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Single-line rendering shown to tool callers
    ///
    /// `"<message> [<KIND>, HTTP <status>, trace id <id>]"`, absent parts omitted.
    pub fn describe(&self) -> String {
        let mut details = vec![self.kind.to_string()];
        if let Some(status) = self.http_status {
            details.push(format!("HTTP {}", status));
        }
        if let Some(ref trace_id) = self.trace_id {
            details.push(format!("trace id {}", trace_id));
        }
        format!("{} [{}]", self.message, details.join(", "))
    }
}

/// Service-level error type
#[derive(Debug, Error)]
pub enum InstagramError {
    /// Classified provider or validation failure
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Missing required setting
    #[error("Missing required setting: {0}")]
    MissingSetting(String),

    /// Credential store is unreadable or incomplete
    #[error("Credential store error: {0}")]
    Credentials(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP server error
    #[error("Server error: {0}")]
    Server(String),
}

impl InstagramError {
    /// Kind of the wrapped [`ApiError`], if this is one
    pub fn kind(&self) -> Option<ApiErrorKind> {
        match self {
            Self::Api(err) => Some(err.kind),
            _ => None,
        }
    }

    /// Text shown to tool callers
    pub fn describe(&self) -> String {
        match self {
            Self::Api(err) => err.describe(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_display() {
        assert_eq!(ApiErrorKind::ExpiredToken.to_string(), "EXPIRED_TOKEN");
        assert_eq!(ApiErrorKind::UnknownError.to_string(), "UNKNOWN_ERROR");
        assert_eq!(
            serde_json::to_string(&ApiErrorKind::InsufficientScope).unwrap(),
            "\"INSUFFICIENT_SCOPE\""
        );
    }

    #[test]
    fn test_kind_flags() {
        assert!(ApiErrorKind::RateLimit.is_retryable());
        assert!(ApiErrorKind::NetworkError.is_retryable());
        assert!(!ApiErrorKind::InvalidRequest.is_retryable());
        assert!(ApiErrorKind::ExpiredToken.requires_reauth());
        assert!(!ApiErrorKind::RateLimit.requires_reauth());
    }

    #[test]
    fn test_describe_full() {
        let err = ApiError::new(ApiErrorKind::ExpiredToken, "token expired")
            .with_status(400)
            .with_trace_id("AbC123");
        assert_eq!(
            err.describe(),
            "token expired [EXPIRED_TOKEN, HTTP 400, trace id AbC123]"
        );
        assert_eq!(err.to_string(), "token expired");
    }

    #[test]
    fn test_describe_minimal() {
        let err = ApiError::invalid_request("Image URL must use HTTPS");
        assert_eq!(err.describe(), "Image URL must use HTTPS [INVALID_REQUEST]");
    }

    #[test]
    fn test_instagram_error_describe() {
        let err = InstagramError::MissingSetting("INSTAGRAM_APP_ID".to_string());
        assert!(err.describe().contains("INSTAGRAM_APP_ID"));
        assert_eq!(err.kind(), None);

        let err: InstagramError = ApiError::unknown("boom").into();
        assert_eq!(err.kind(), Some(ApiErrorKind::UnknownError));
    }
}

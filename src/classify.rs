//! Error classifier
//!
//! Turns any raw failure into an [`ApiError`]. First match wins:
//!
//! 1. an already classified error is returned unchanged;
//! 2. a provider envelope `{"error": {"code", "message", "fbtrace_id"}}` is
//!    mapped by numeric code;
//! 3. a non-success HTTP response (or a transport failure without one)
//!    becomes `NETWORK_ERROR`;
//! 4. everything else becomes `UNKNOWN_ERROR` with the original message.

use serde::Deserialize;

use crate::error::{ApiError, ApiErrorKind};

/// Raw failure handed to [`classify`]
#[derive(Debug)]
pub enum Failure {
    /// Already classified, passes through untouched
    Classified(ApiError),
    /// No HTTP response was received (DNS, refused connection, timeout)
    Transport {
        /// Transport error text
        message: String,
        /// Whether the request timed out
        timeout: bool,
    },
    /// An HTTP response was received
    Response {
        /// HTTP status code
        status: u16,
        /// Raw response body
        body: String,
    },
    /// Any other failure
    Other(String),
}

impl From<ApiError> for Failure {
    fn from(err: ApiError) -> Self {
        Failure::Classified(err)
    }
}

impl From<reqwest::Error> for Failure {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => Failure::Response {
                status: status.as_u16(),
                body: String::new(),
            },
            None => Failure::Transport {
                timeout: err.is_timeout(),
                message: err.to_string(),
            },
        }
    }
}

impl From<serde_json::Error> for Failure {
    fn from(err: serde_json::Error) -> Self {
        Failure::Other(format!("Malformed JSON: {}", err))
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ProviderError,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    fbtrace_id: Option<String>,
}

/// Map a provider numeric error code to a kind
pub fn kind_for_provider_code(code: Option<i64>) -> ApiErrorKind {
    match code {
        Some(190) => ApiErrorKind::ExpiredToken,
        Some(100) | Some(200) => ApiErrorKind::InsufficientScope,
        Some(4) | Some(17) => ApiErrorKind::RateLimit,
        _ => ApiErrorKind::InvalidRequest,
    }
}

fn parse_envelope(body: &str) -> Option<ProviderError> {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .map(|envelope| envelope.error)
}

/// Classify a raw failure. Never panics.
pub fn classify(failure: Failure) -> ApiError {
    match failure {
        Failure::Classified(err) => err,
        Failure::Response { status, body } => {
            if let Some(provider) = parse_envelope(&body) {
                let kind = kind_for_provider_code(provider.code);
                let message = provider
                    .message
                    .unwrap_or_else(|| format!("Instagram API error (HTTP {})", status));
                let mut err = ApiError::new(kind, message).with_status(status);
                err.trace_id = provider.fbtrace_id;
                return err;
            }
            if (200..300).contains(&status) {
                return ApiError::unknown(if body.is_empty() {
                    "Unexpected Instagram API response".to_string()
                } else {
                    body
                });
            }
            ApiError::new(
                ApiErrorKind::NetworkError,
                format!("Instagram API request failed with HTTP {}", status),
            )
            .with_status(status)
        }
        Failure::Transport { message, timeout } => {
            let prefix = if timeout {
                "Request to Instagram timed out"
            } else {
                "Could not reach Instagram"
            };
            ApiError::new(ApiErrorKind::NetworkError, format!("{}: {}", prefix, message))
        }
        Failure::Other(message) => ApiError::unknown(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn response(status: u16, body: &str) -> Failure {
        Failure::Response {
            status,
            body: body.to_string(),
        }
    }

    #[test]
    fn test_classified_passes_through() {
        let original = ApiError::new(ApiErrorKind::RateLimit, "slow down").with_status(429);
        let err = classify(Failure::Classified(original));
        assert_eq!(err.kind, ApiErrorKind::RateLimit);
        assert_eq!(err.message, "slow down");
        assert_eq!(err.http_status, Some(429));
    }

    #[test]
    fn test_expired_token_envelope() {
        let body = serde_json::json!({
            "error": {
                "message": "token expired",
                "type": "OAuthException",
                "code": 190,
                "fbtrace_id": "AxYz"
            }
        });
        let err = classify(response(400, &body.to_string()));
        assert_eq!(err.kind, ApiErrorKind::ExpiredToken);
        assert_eq!(err.message, "token expired");
        assert_eq!(err.trace_id.as_deref(), Some("AxYz"));
        assert_eq!(err.http_status, Some(400));
    }

    #[test]
    fn test_provider_code_mapping() {
        assert_eq!(kind_for_provider_code(Some(190)), ApiErrorKind::ExpiredToken);
        assert_eq!(kind_for_provider_code(Some(100)), ApiErrorKind::InsufficientScope);
        assert_eq!(kind_for_provider_code(Some(200)), ApiErrorKind::InsufficientScope);
        assert_eq!(kind_for_provider_code(Some(4)), ApiErrorKind::RateLimit);
        assert_eq!(kind_for_provider_code(Some(17)), ApiErrorKind::RateLimit);
        assert_eq!(kind_for_provider_code(Some(9004)), ApiErrorKind::InvalidRequest);
        assert_eq!(kind_for_provider_code(None), ApiErrorKind::InvalidRequest);
    }

    #[test]
    fn test_non_json_body_uses_status() {
        let err = classify(response(502, "<html>Bad Gateway</html>"));
        assert_eq!(err.kind, ApiErrorKind::NetworkError);
        assert_eq!(err.http_status, Some(502));
    }

    #[test]
    fn test_json_without_envelope_uses_status() {
        let err = classify(response(500, r#"{"detail":"oops"}"#));
        assert_eq!(err.kind, ApiErrorKind::NetworkError);
        assert_eq!(err.http_status, Some(500));
    }

    #[test]
    fn test_transport_failure_is_network_error() {
        let err = classify(Failure::Transport {
            message: "connection refused".to_string(),
            timeout: false,
        });
        assert_eq!(err.kind, ApiErrorKind::NetworkError);
        assert_eq!(err.http_status, None);
        assert!(err.message.contains("connection refused"));
    }

    #[test]
    fn test_other_is_unknown() {
        let err = classify(Failure::Other("something odd".to_string()));
        assert_eq!(err.kind, ApiErrorKind::UnknownError);
        assert_eq!(err.message, "something odd");
    }

    #[test]
    fn test_envelope_without_message() {
        let err = classify(response(403, r#"{"error":{"code":200}}"#));
        assert_eq!(err.kind, ApiErrorKind::InsufficientScope);
        assert!(err.message.contains("403"));
    }
}

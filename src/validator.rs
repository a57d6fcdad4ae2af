//! Image pre-flight validation
//!
//! Advisory only: the provider still validates the media when the container
//! is created. Rules, first failure wins: HTTPS scheme, a successful HEAD
//! response, and a JPEG content type.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client};
use tracing::debug;

use crate::error::ApiError;

/// Response metadata of a HEAD probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResponse {
    /// HTTP status code
    pub status: u16,
    /// `Content-Type` header, if present
    pub content_type: Option<String>,
}

/// Issues the HEAD request for a media URL
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaProbe: Send + Sync {
    /// Probe the URL; `Err` carries the transport error text
    async fn head(&self, url: &str) -> std::result::Result<ProbeResponse, String>;
}

/// [`MediaProbe`] backed by `reqwest`
#[derive(Debug, Clone)]
pub struct HttpMediaProbe {
    http: Client,
}

impl HttpMediaProbe {
    /// Create a probe around an existing client
    pub fn new(http: Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl MediaProbe for HttpMediaProbe {
    async fn head(&self, url: &str) -> std::result::Result<ProbeResponse, String> {
        let response = self
            .http
            .head(url)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        Ok(ProbeResponse {
            status: response.status().as_u16(),
            content_type,
        })
    }
}

/// Pre-flight checks for single image posts
#[derive(Clone)]
pub struct MediaValidator {
    probe: Arc<dyn MediaProbe>,
}

impl MediaValidator {
    /// Create a validator using the given probe
    pub fn new(probe: Arc<dyn MediaProbe>) -> Self {
        Self { probe }
    }

    /// Validate an image URL before any container is created
    pub async fn validate(&self, image_url: &str) -> std::result::Result<(), ApiError> {
        let parsed = url::Url::parse(image_url)
            .map_err(|e| ApiError::invalid_request(format!("Invalid image URL: {}", e)))?;
        if parsed.scheme() != "https" {
            return Err(ApiError::invalid_request("Image URL must use HTTPS"));
        }

        let response = self.probe.head(image_url).await.map_err(|e| {
            ApiError::invalid_request(format!("Image URL is not reachable: {}", e))
        })?;

        if !(200..300).contains(&response.status) {
            return Err(ApiError::invalid_request(format!(
                "Image URL is not accessible (HTTP {})",
                response.status
            ))
            .with_status(response.status));
        }

        let content_type = response.content_type.unwrap_or_default().to_ascii_lowercase();
        if !(content_type.contains("image/jpeg") || content_type.contains("image/jpg")) {
            return Err(ApiError::invalid_request(format!(
                "Image must be a JPEG, got content type {:?}",
                content_type
            )));
        }

        debug!("Validated image {}", image_url);
        Ok(())
    }
}

//! Graph API request executor
//!
//! One HTTP call per [`GraphClient::execute`]: form-encoded for POST,
//! query-encoded for GET, JSON decoded on success and routed through the
//! classifier on failure.

use reqwest::{Client, Method};
use serde_json::Value;
use tracing::debug;

use crate::classify::{classify, Failure};
use crate::config::InstagramConfig;
use crate::error::{ApiError, InstagramError, Result};
use crate::types::{ContainerStatus, MediaContainer, MediaKind};

/// Thin client over `https://graph.instagram.com/{version}/...`
#[derive(Debug, Clone)]
pub struct GraphClient {
    http: Client,
    base_url: String,
    api_version: String,
}

impl GraphClient {
    /// Build a client from configuration
    pub fn new(config: &InstagramConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| InstagramError::ConfigError(format!("Failed to create client: {}", e)))?;
        Ok(Self::with_http(http, config))
    }

    /// Build a client around an existing `reqwest::Client`
    pub fn with_http(http: Client, config: &InstagramConfig) -> Self {
        Self {
            http,
            base_url: config.graph_url.trim_end_matches('/').to_string(),
            api_version: config.api_version.clone(),
        }
    }

    /// Versioned endpoint URL for a path such as `{user_id}/media`
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url,
            self.api_version,
            path.trim_start_matches('/')
        )
    }

    /// Issue one request and return the decoded JSON body
    pub async fn execute(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, &str)],
    ) -> std::result::Result<Value, ApiError> {
        let url = self.endpoint(path);
        debug!("Graph API {} {}", method, url);

        let request = if method == Method::GET {
            self.http.request(method, &url).query(params)
        } else {
            self.http.request(method, &url).form(params)
        };

        let response = request
            .send()
            .await
            .map_err(|e| classify(Failure::from(e)))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| classify(Failure::from(e)))?;

        if !status.is_success() {
            return Err(classify(Failure::Response {
                status: status.as_u16(),
                body,
            }));
        }

        serde_json::from_str(&body).map_err(|e| {
            ApiError::unknown("Instagram returned a response that is not valid JSON")
                .with_status(status.as_u16())
                .with_source(e)
        })
    }

    /// Create a media container; `params` excludes the access token
    pub async fn create_container(
        &self,
        user_id: &str,
        access_token: &str,
        kind: MediaKind,
        params: &[(&str, &str)],
    ) -> std::result::Result<MediaContainer, ApiError> {
        let mut form: Vec<(&str, &str)> = params.to_vec();
        form.push(("access_token", access_token));

        let body = self
            .execute(Method::POST, &format!("{}/media", user_id), &form)
            .await?;
        let id = response_id(&body).ok_or_else(|| {
            ApiError::unknown("Container creation response did not include an id")
        })?;

        debug!("Created {} container {}", kind, id);
        Ok(MediaContainer {
            id,
            kind,
            status: ContainerStatus::InProgress,
            owner_user_id: user_id.to_string(),
        })
    }

    /// Fetch the current `status_code` of a container
    pub async fn container_status(
        &self,
        access_token: &str,
        container_id: &str,
    ) -> std::result::Result<ContainerStatus, ApiError> {
        let body = self
            .execute(
                Method::GET,
                container_id,
                &[("fields", "status_code"), ("access_token", access_token)],
            )
            .await?;

        body.get("status_code")
            .and_then(Value::as_str)
            .map(ContainerStatus::parse)
            .ok_or_else(|| ApiError::unknown("Status response did not include status_code"))
    }

    /// Publish a container and return the post id
    pub async fn publish_container(
        &self,
        user_id: &str,
        access_token: &str,
        creation_id: &str,
    ) -> std::result::Result<String, ApiError> {
        let body = self
            .execute(
                Method::POST,
                &format!("{}/media_publish", user_id),
                &[("creation_id", creation_id), ("access_token", access_token)],
            )
            .await?;

        response_id(&body)
            .ok_or_else(|| ApiError::unknown("Publish response did not include a media id"))
    }
}

/// Non-empty `id` of a response body, string or numeric
pub(crate) fn response_id(body: &Value) -> Option<String> {
    match body.get("id")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiErrorKind;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> GraphClient {
        let config = InstagramConfig::default().with_base_urls(server.uri(), server.uri());
        GraphClient::new(&config).unwrap()
    }

    #[test]
    fn test_response_id() {
        assert_eq!(response_id(&json!({"id": "123"})), Some("123".to_string()));
        assert_eq!(response_id(&json!({"id": 456})), Some("456".to_string()));
        assert_eq!(response_id(&json!({"id": ""})), None);
        assert_eq!(response_id(&json!({})), None);
    }

    #[test]
    fn test_endpoint() {
        let config = InstagramConfig::default().with_base_urls("https://graph.test/", "https://x");
        let client = GraphClient::new(&config).unwrap();
        assert_eq!(
            client.endpoint("/1784/media"),
            "https://graph.test/v19.0/1784/media"
        );
    }

    #[tokio::test]
    async fn test_create_container_form_encoded() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v19.0/1784/media"))
            .and(body_string_contains("image_url=https%3A%2F%2Fcdn.example.com%2Fa.jpg"))
            .and(body_string_contains("access_token=tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "123"})))
            .expect(1)
            .mount(&server)
            .await;

        let container = client_for(&server)
            .create_container(
                "1784",
                "tok",
                MediaKind::Image,
                &[("image_url", "https://cdn.example.com/a.jpg")],
            )
            .await
            .unwrap();

        assert_eq!(container.id, "123");
        assert_eq!(container.kind, MediaKind::Image);
        assert_eq!(container.owner_user_id, "1784");
    }

    #[tokio::test]
    async fn test_container_status_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v19.0/c-1"))
            .and(query_param("fields", "status_code"))
            .and(query_param("access_token", "tok"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"status_code": "IN_PROGRESS", "id": "c-1"})),
            )
            .mount(&server)
            .await;

        let status = client_for(&server)
            .container_status("tok", "c-1")
            .await
            .unwrap();
        assert_eq!(status, ContainerStatus::InProgress);
    }

    #[tokio::test]
    async fn test_provider_error_is_classified() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v19.0/1784/media_publish"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {
                    "message": "token expired",
                    "type": "OAuthException",
                    "code": 190,
                    "fbtrace_id": "Ab12"
                }
            })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .publish_container("1784", "tok", "123")
            .await
            .unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::ExpiredToken);
        assert_eq!(err.message, "token expired");
        assert_eq!(err.trace_id.as_deref(), Some("Ab12"));
    }

    #[tokio::test]
    async fn test_non_json_error_uses_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .container_status("tok", "c-1")
            .await
            .unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::NetworkError);
        assert_eq!(err.http_status, Some(503));
    }

    #[tokio::test]
    async fn test_publish_without_id_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .publish_container("1784", "tok", "123")
            .await
            .unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::UnknownError);
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        // Nothing listens on port 9 locally.
        let config =
            InstagramConfig::default().with_base_urls("http://127.0.0.1:9", "http://127.0.0.1:9");
        let err = GraphClient::new(&config)
            .unwrap()
            .container_status("tok", "c-1")
            .await
            .unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::NetworkError);
        assert_eq!(err.http_status, None);
    }
}

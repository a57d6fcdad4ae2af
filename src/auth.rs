//! OAuth helpers
//!
//! Authorization URL construction (pure) and the code → short-lived token →
//! long-lived token exchange used by the callback server.

use chrono::Utc;
use reqwest::Client;
use serde_json::Value;
use tracing::info;
use url::Url;

use crate::classify::{classify, Failure};
use crate::config::InstagramConfig;
use crate::credentials::StoredCredentials;
use crate::error::{ApiError, ApiErrorKind, InstagramError, Result};
use crate::types::AuthorizationUrl;

/// Build the authorization dialog URL
///
/// Fails with `MissingSetting("INSTAGRAM_APP_ID")` when no app id is configured.
pub fn authorization_url(config: &InstagramConfig) -> Result<AuthorizationUrl> {
    let app_id = config.require_app_id()?;
    let mut url = Url::parse(&config.authorize_url)
        .map_err(|e| InstagramError::ConfigError(format!("Authorize URL is invalid: {}", e)))?;

    url.query_pairs_mut()
        .append_pair("client_id", app_id)
        .append_pair("redirect_uri", &config.redirect_uri)
        .append_pair("response_type", "code")
        .append_pair("scope", &config.scopes.join(","));

    Ok(AuthorizationUrl {
        auth_url: url.into(),
    })
}

/// Exchanges authorization codes for long-lived tokens
#[derive(Debug, Clone)]
pub struct OAuthClient {
    http: Client,
    config: InstagramConfig,
}

impl OAuthClient {
    /// Create a client
    pub fn new(config: InstagramConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| InstagramError::ConfigError(format!("Failed to create client: {}", e)))?;
        Ok(Self { http, config })
    }

    /// Exchange an authorization code and return the record to persist
    pub async fn exchange_code(&self, code: &str) -> Result<StoredCredentials> {
        let app_id = self.config.require_app_id()?;
        let app_secret = self.config.require_app_secret()?;

        let token_url = format!("{}/oauth/access_token", trim_base(&self.config.oauth_url));
        let short = self
            .send(self.http.post(token_url).form(&[
                ("client_id", app_id),
                ("client_secret", app_secret),
                ("grant_type", "authorization_code"),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("code", code),
            ]))
            .await?;
        let short_token = access_token(&short)?;
        let user_id = user_id(&short).ok_or_else(|| {
            ApiError::new(
                ApiErrorKind::InvalidToken,
                "Token exchange response did not include a user id",
            )
        })?;

        let long = self
            .send(
                self.http
                    .get(format!("{}/access_token", trim_base(&self.config.graph_url)))
                    .query(&[
                        ("grant_type", "ig_exchange_token"),
                        ("client_secret", app_secret),
                        ("access_token", short_token.as_str()),
                    ]),
            )
            .await?;
        let long_token = access_token(&long)?;

        info!("Obtained long-lived token for Instagram user {}", user_id);
        Ok(StoredCredentials {
            id: Some(user_id),
            access_token: Some(long_token),
            refresh_token: None,
            expires_in: long.get("expires_in").and_then(Value::as_u64),
            obtained_at: Some(Utc::now()),
        })
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> std::result::Result<Value, ApiError> {
        let response = request.send().await.map_err(|e| classify(e.into()))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| classify(e.into()))?;

        if !status.is_success() {
            return Err(classify(Failure::Response {
                status: status.as_u16(),
                body,
            }));
        }

        serde_json::from_str(&body).map_err(|e| classify(e.into()))
    }
}

fn trim_base(url: &str) -> &str {
    url.trim_end_matches('/')
}

fn access_token(body: &Value) -> std::result::Result<String, ApiError> {
    body.get("access_token")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            ApiError::new(
                ApiErrorKind::InvalidToken,
                "Token exchange response did not include an access token",
            )
        })
}

fn user_id(body: &Value) -> Option<String> {
    match body.get("user_id")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_authorization_url() {
        let config = InstagramConfig::default()
            .with_app_id("990")
            .with_redirect_uri("https://example.com/auth/callback");
        let url = authorization_url(&config).unwrap();
        let parsed = Url::parse(&url.auth_url).unwrap();

        assert_eq!(parsed.host_str(), Some("www.instagram.com"));
        assert_eq!(parsed.path(), "/oauth/authorize");
        let pairs: std::collections::HashMap<_, _> = parsed.query_pairs().into_owned().collect();
        assert_eq!(pairs["client_id"], "990");
        assert_eq!(pairs["redirect_uri"], "https://example.com/auth/callback");
        assert_eq!(pairs["response_type"], "code");
        assert_eq!(
            pairs["scope"],
            "instagram_business_basic,instagram_business_content_publish"
        );
    }

    #[test]
    fn test_authorization_url_requires_app_id() {
        let err = authorization_url(&InstagramConfig::default()).unwrap_err();
        assert!(matches!(err, InstagramError::MissingSetting(ref s) if s == "INSTAGRAM_APP_ID"));
    }

    fn oauth_config(server: &MockServer) -> InstagramConfig {
        InstagramConfig::default()
            .with_app_id("990")
            .with_app_secret("shh")
            .with_base_urls(server.uri(), server.uri())
    }

    #[tokio::test]
    async fn test_exchange_code() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/access_token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code=abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "short",
                "user_id": 17841400000u64,
                "permissions": ["instagram_business_basic"]
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/access_token"))
            .and(query_param("grant_type", "ig_exchange_token"))
            .and(query_param("access_token", "short"))
            .and(query_param("client_secret", "shh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "long",
                "token_type": "bearer",
                "expires_in": 5183944
            })))
            .expect(1)
            .mount(&server)
            .await;

        let record = OAuthClient::new(oauth_config(&server))
            .unwrap()
            .exchange_code("abc")
            .await
            .unwrap();

        assert_eq!(record.id.as_deref(), Some("17841400000"));
        assert_eq!(record.access_token.as_deref(), Some("long"));
        assert_eq!(record.expires_in, Some(5183944));
        assert!(record.obtained_at.is_some());
    }

    #[tokio::test]
    async fn test_exchange_code_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/access_token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {"message": "Invalid authorization code", "code": 100, "fbtrace_id": "F1"}
            })))
            .mount(&server)
            .await;

        let err = OAuthClient::new(oauth_config(&server))
            .unwrap()
            .exchange_code("bad")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(ApiErrorKind::InsufficientScope));
    }

    #[tokio::test]
    async fn test_exchange_without_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"user_id": "1"})))
            .mount(&server)
            .await;

        let err = OAuthClient::new(oauth_config(&server))
            .unwrap()
            .exchange_code("abc")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(ApiErrorKind::InvalidToken));
    }

    #[tokio::test]
    async fn test_exchange_requires_secret() {
        let config = InstagramConfig::default().with_app_id("990");
        let err = OAuthClient::new(config)
            .unwrap()
            .exchange_code("abc")
            .await
            .unwrap_err();
        assert!(
            matches!(err, InstagramError::MissingSetting(ref s) if s == "INSTAGRAM_APP_SECRET")
        );
    }
}

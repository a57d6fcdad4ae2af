//! Instagram tools configuration
//!
//! Configuration can be loaded from environment variables or constructed programmatically.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{InstagramError, Result};
use crate::{
    DEFAULT_API_VERSION, DEFAULT_AUTHORIZE_URL, DEFAULT_GRAPH_URL, DEFAULT_MAX_WAIT_MS,
    DEFAULT_OAUTH_URL, DEFAULT_POLL_INTERVAL_MS, DEFAULT_SCOPES,
};

/// Default OAuth redirect URI
pub const DEFAULT_REDIRECT_URI: &str = "https://localhost:3000/auth/callback";
/// Default credential file path
pub const DEFAULT_CREDENTIALS_PATH: &str = "credentials.json";

/// Instagram tools configuration
///
/// Nothing here is required to publish: credentials arrive per call or
/// from the credential store. The app id and secret only gate the OAuth
/// operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstagramConfig {
    /// Instagram app id (required for auth URL generation)
    pub app_id: Option<String>,

    /// Instagram app secret (required for the code exchange)
    pub app_secret: Option<String>,

    /// OAuth redirect URI registered with the app
    pub redirect_uri: String,

    /// Permissions requested during authorization
    pub scopes: Vec<String>,

    /// Graph API base URL
    pub graph_url: String,

    /// OAuth API base URL (short-lived token exchange)
    pub oauth_url: String,

    /// Authorization dialog URL
    pub authorize_url: String,

    /// Graph API version path segment
    pub api_version: String,

    /// Single-record credential store
    pub credentials_path: PathBuf,

    /// Readiness poll interval in milliseconds
    pub poll_interval_ms: u64,

    /// Readiness poll deadline in milliseconds
    pub max_wait_ms: u64,

    /// HTTP request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for InstagramConfig {
    fn default() -> Self {
        Self {
            app_id: None,
            app_secret: None,
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            scopes: DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
            graph_url: DEFAULT_GRAPH_URL.to_string(),
            oauth_url: DEFAULT_OAUTH_URL.to_string(),
            authorize_url: DEFAULT_AUTHORIZE_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            credentials_path: PathBuf::from(DEFAULT_CREDENTIALS_PATH),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            max_wait_ms: DEFAULT_MAX_WAIT_MS,
            request_timeout_secs: 30,
        }
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_u64(name: &str) -> Result<Option<u64>> {
    match env_string(name) {
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| {
                InstagramError::ConfigError(format!("{} must be an integer, got {:?}", name, raw))
            }),
        None => Ok(None),
    }
}

impl InstagramConfig {
    /// Load configuration from environment variables
    ///
    /// # Optional Variables
    ///
    /// - `INSTAGRAM_APP_ID`, `INSTAGRAM_APP_SECRET`: OAuth app credentials
    /// - `INSTAGRAM_REDIRECT_URI`: OAuth redirect URI
    /// - `INSTAGRAM_SCOPES`: comma-separated permissions
    /// - `INSTAGRAM_GRAPH_URL`, `INSTAGRAM_OAUTH_URL`, `INSTAGRAM_AUTHORIZE_URL`: endpoints
    /// - `INSTAGRAM_API_VERSION`: Graph API version, e.g. `v19.0`
    /// - `INSTAGRAM_CREDENTIALS_PATH`: credential store path
    /// - `INSTAGRAM_POLL_INTERVAL_MS`, `INSTAGRAM_MAX_WAIT_MS`: readiness polling
    /// - `INSTAGRAM_REQUEST_TIMEOUT_SECS`: HTTP timeout
    ///
    /// # Errors
    ///
    /// Returns `InstagramError::ConfigError` if a numeric variable does not
    /// parse or the resulting configuration fails [`validate`](Self::validate).
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let scopes = env_string("INSTAGRAM_SCOPES")
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or(defaults.scopes);

        let config = Self {
            app_id: env_string("INSTAGRAM_APP_ID"),
            app_secret: env_string("INSTAGRAM_APP_SECRET"),
            redirect_uri: env_string("INSTAGRAM_REDIRECT_URI").unwrap_or(defaults.redirect_uri),
            scopes,
            graph_url: env_string("INSTAGRAM_GRAPH_URL").unwrap_or(defaults.graph_url),
            oauth_url: env_string("INSTAGRAM_OAUTH_URL").unwrap_or(defaults.oauth_url),
            authorize_url: env_string("INSTAGRAM_AUTHORIZE_URL")
                .unwrap_or(defaults.authorize_url),
            api_version: env_string("INSTAGRAM_API_VERSION").unwrap_or(defaults.api_version),
            credentials_path: env_string("INSTAGRAM_CREDENTIALS_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.credentials_path),
            poll_interval_ms: env_u64("INSTAGRAM_POLL_INTERVAL_MS")?
                .unwrap_or(defaults.poll_interval_ms),
            max_wait_ms: env_u64("INSTAGRAM_MAX_WAIT_MS")?.unwrap_or(defaults.max_wait_ms),
            request_timeout_secs: env_u64("INSTAGRAM_REQUEST_TIMEOUT_SECS")?
                .unwrap_or(defaults.request_timeout_secs),
        };

        config.validate()?;
        Ok(config)
    }

    /// Set app id (builder pattern)
    pub fn with_app_id(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = Some(app_id.into());
        self
    }

    /// Set app secret (builder pattern)
    pub fn with_app_secret(mut self, app_secret: impl Into<String>) -> Self {
        self.app_secret = Some(app_secret.into());
        self
    }

    /// Set redirect URI (builder pattern)
    pub fn with_redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
        self.redirect_uri = redirect_uri.into();
        self
    }

    /// Point Graph and OAuth calls at another host (builder pattern)
    pub fn with_base_urls(
        mut self,
        graph_url: impl Into<String>,
        oauth_url: impl Into<String>,
    ) -> Self {
        self.graph_url = graph_url.into();
        self.oauth_url = oauth_url.into();
        self
    }

    /// Set credential store path (builder pattern)
    pub fn with_credentials_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.credentials_path = path.into();
        self
    }

    /// Set readiness polling (builder pattern)
    pub fn with_polling(mut self, poll_interval_ms: u64, max_wait_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self.max_wait_ms = max_wait_ms;
        self
    }

    /// Readiness poll interval
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Readiness poll deadline
    pub fn max_wait(&self) -> Duration {
        Duration::from_millis(self.max_wait_ms)
    }

    /// HTTP request timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// App id, or `MissingSetting` when absent
    pub fn require_app_id(&self) -> Result<&str> {
        self.app_id
            .as_deref()
            .ok_or_else(|| InstagramError::MissingSetting("INSTAGRAM_APP_ID".to_string()))
    }

    /// App secret, or `MissingSetting` when absent
    pub fn require_app_secret(&self) -> Result<&str> {
        self.app_secret
            .as_deref()
            .ok_or_else(|| InstagramError::MissingSetting("INSTAGRAM_APP_SECRET".to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.api_version.trim().is_empty() {
            return Err(InstagramError::ConfigError(
                "API version cannot be empty".to_string(),
            ));
        }

        for (name, value) in [
            ("Graph URL", &self.graph_url),
            ("OAuth URL", &self.oauth_url),
            ("Authorize URL", &self.authorize_url),
        ] {
            let parsed = url::Url::parse(value)
                .map_err(|e| InstagramError::ConfigError(format!("{} is invalid: {}", name, e)))?;
            if parsed.scheme() != "https" && parsed.scheme() != "http" {
                return Err(InstagramError::ConfigError(format!(
                    "{} must be an http(s) URL",
                    name
                )));
            }
        }

        if self.poll_interval_ms == 0 {
            return Err(InstagramError::ConfigError(
                "Poll interval must be greater than zero".to_string(),
            ));
        }

        if self.max_wait_ms < self.poll_interval_ms {
            return Err(InstagramError::ConfigError(
                "Max wait must be at least one poll interval".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = InstagramConfig::default();
        assert_eq!(config.api_version, "v19.0");
        assert_eq!(config.graph_url, "https://graph.instagram.com");
        assert_eq!(config.poll_interval_ms, 3000);
        assert_eq!(config.max_wait_ms, 60000);
        assert!(config.app_id.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder_pattern() {
        let config = InstagramConfig::default()
            .with_app_id("12345")
            .with_polling(10, 100)
            .with_credentials_path("/tmp/creds.json");

        assert_eq!(config.app_id.as_deref(), Some("12345"));
        assert_eq!(config.poll_interval(), Duration::from_millis(10));
        assert_eq!(config.max_wait(), Duration::from_millis(100));
        assert_eq!(config.credentials_path, PathBuf::from("/tmp/creds.json"));
    }

    #[test]
    fn test_require_app_id() {
        let config = InstagramConfig::default();
        assert!(matches!(
            config.require_app_id(),
            Err(InstagramError::MissingSetting(ref s)) if s == "INSTAGRAM_APP_ID"
        ));
        let config = config.with_app_id("abc");
        assert_eq!(config.require_app_id().unwrap(), "abc");
    }

    #[test]
    fn test_validate_invalid_polling() {
        let config = InstagramConfig::default().with_polling(0, 1000);
        assert!(config.validate().is_err());

        let config = InstagramConfig::default().with_polling(5000, 1000);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_invalid_url() {
        let config = InstagramConfig::default().with_base_urls("ftp://graph", "https://api");
        assert!(config.validate().is_err());

        let config = InstagramConfig::default().with_base_urls("not a url", "https://api");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_empty_version() {
        let mut config = InstagramConfig::default();
        config.api_version = " ".to_string();
        assert!(config.validate().is_err());
    }
}

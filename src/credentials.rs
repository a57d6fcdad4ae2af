//! Credential sources
//!
//! The publish pipeline never reads credentials itself; callers hand them in
//! or the service asks a [`CredentialProvider`].

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::error::{InstagramError, Result};
use crate::types::Credentials;

/// Supplies the credentials of the connected account
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Load the current credentials
    ///
    /// `Ok(None)` means nothing is stored yet; a store that exists but is
    /// incomplete is an error.
    async fn load(&self) -> Result<Option<Credentials>>;
}

/// On-disk record written by the OAuth callback
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredCredentials {
    /// Instagram user id (the provider issues it as a number)
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    /// Long-lived access token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// Refresh token, when the provider issues one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Token lifetime in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
    /// When the token was obtained
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obtained_at: Option<DateTime<Utc>>,
}

impl StoredCredentials {
    /// Required fields as [`Credentials`]
    pub fn credentials(&self) -> Result<Credentials> {
        let id = self
            .id
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| InstagramError::Credentials("missing required field `id`".to_string()))?;
        let access_token = self
            .access_token
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| {
                InstagramError::Credentials("missing required field `accessToken`".to_string())
            })?;
        Ok(Credentials::new(id, access_token))
    }

    /// Expiry instant, when both lifetime and issue time are known
    ///
    /// `None` as well when the stored values do not fit a timestamp.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let obtained_at = self.obtained_at?;
        let expires_in = i64::try_from(self.expires_in?).ok()?;
        obtained_at.checked_add_signed(chrono::Duration::try_seconds(expires_in)?)
    }
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a string or number, got {}",
            other
        ))),
    }
}

/// Single-record JSON credential file
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    /// Store backed by `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read the raw record; `None` when the file does not exist
    pub async fn read(&self) -> Result<Option<StoredCredentials>> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        serde_json::from_str(&raw).map(Some).map_err(|e| {
            InstagramError::Credentials(format!("{} is not valid JSON: {}", self.path.display(), e))
        })
    }

    /// Overwrite the record
    pub async fn save(&self, record: &StoredCredentials) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(record)?;
        tokio::fs::write(&self.path, json).await?;
        info!("Saved Instagram credentials to {}", self.path.display());
        Ok(())
    }
}

#[async_trait]
impl CredentialProvider for FileCredentialStore {
    async fn load(&self) -> Result<Option<Credentials>> {
        let Some(record) = self.read().await? else {
            return Ok(None);
        };
        if let Some(expires_at) = record.expires_at().filter(|at| *at <= Utc::now()) {
            warn!("Stored Instagram token expired at {}", expires_at);
        }
        record.credentials().map(Some)
    }
}

/// Fixed credentials, e.g. from the environment or tests
#[derive(Debug, Clone)]
pub struct StaticCredentials {
    credentials: Option<Credentials>,
}

impl StaticCredentials {
    /// Provider that always returns `credentials`
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials: Some(credentials),
        }
    }

    /// Provider with nothing stored
    pub fn empty() -> Self {
        Self { credentials: None }
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentials {
    async fn load(&self) -> Result<Option<Credentials>> {
        Ok(self.credentials.clone())
    }
}

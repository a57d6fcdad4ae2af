//! Instagram service implementation
//!
//! Provides the [`InstagramService`] behind the tool surface: it resolves
//! credentials and drives the publish pipelines.

use std::sync::Arc;

use tracing::{debug, info};

use crate::auth::authorization_url;
use crate::config::InstagramConfig;
use crate::credentials::{CredentialProvider, FileCredentialStore};
use crate::error::{ApiError, Result};
use crate::publish::{check_caption, check_carousel_size, InstagramPublisher};
use crate::types::{
    AuthorizationUrl, CarouselPost, Credentials, ImagePost, PublishResult, ReelPost,
};

/// Credentials passed explicitly with a tool call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialOverride {
    /// Instagram user id
    pub user_id: Option<String>,
    /// Access token
    pub access_token: Option<String>,
}

impl CredentialOverride {
    /// Override carrying both fields
    pub fn new(user_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            access_token: Some(access_token.into()),
        }
    }

    fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref().filter(|s| !s.trim().is_empty())
    }

    fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref().filter(|s| !s.trim().is_empty())
    }
}

/// Instagram publishing service
///
/// Holds no per-call state; concurrent calls share nothing but the HTTP
/// connection pool.
pub struct InstagramService {
    config: InstagramConfig,
    publisher: InstagramPublisher,
    credentials: Arc<dyn CredentialProvider>,
}

impl InstagramService {
    /// Create a service using the configured credential file
    pub fn new(config: InstagramConfig) -> Result<Self> {
        config.validate()?;
        let publisher = InstagramPublisher::new(&config)?;
        let credentials = Arc::new(FileCredentialStore::new(config.credentials_path.clone()));
        Ok(Self::from_parts(config, publisher, credentials))
    }

    /// Create a service from explicit collaborators
    pub fn from_parts(
        config: InstagramConfig,
        publisher: InstagramPublisher,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        Self {
            config,
            publisher,
            credentials,
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &InstagramConfig {
        &self.config
    }

    /// Build the authorization URL
    pub fn auth_url(&self) -> Result<AuthorizationUrl> {
        authorization_url(&self.config)
    }

    /// Resolve credentials for one call
    ///
    /// A complete override is used as is. Otherwise the provider is asked and
    /// any explicit field replaces the stored one.
    pub async fn resolve_credentials(&self, explicit: &CredentialOverride) -> Result<Credentials> {
        if let (Some(user_id), Some(access_token)) = (explicit.user_id(), explicit.access_token()) {
            debug!("Using credentials supplied with the request");
            return Ok(Credentials::new(user_id, access_token));
        }

        let stored = self.credentials.load().await?;
        let user_id = explicit
            .user_id()
            .map(str::to_string)
            .or_else(|| stored.as_ref().map(|c| c.user_id.clone()));
        let access_token = explicit
            .access_token()
            .map(str::to_string)
            .or_else(|| stored.as_ref().map(|c| c.access_token.clone()));

        match (user_id, access_token) {
            (Some(user_id), Some(access_token)) => Ok(Credentials::new(user_id, access_token)),
            (None, Some(_)) => Err(ApiError::invalid_request(
                "Missing Instagram user id: pass igUserId or connect an account first",
            )
            .into()),
            (Some(_), None) => Err(ApiError::invalid_request(
                "Missing access token: pass userAccessToken or connect an account first",
            )
            .into()),
            (None, None) => Err(ApiError::invalid_request(
                "No Instagram credentials: pass userAccessToken and igUserId \
                 or connect an account with instagram-auth",
            )
            .into()),
        }
    }

    /// Publish a single image
    pub async fn post_image(
        &self,
        explicit: &CredentialOverride,
        post: &ImagePost,
    ) -> Result<PublishResult> {
        check_caption(post.caption.as_deref())?;
        let credentials = self.resolve_credentials(explicit).await?;
        let result = self.publisher.post_image(&credentials, post).await?;
        info!("Image published as {}", result.post_id);
        Ok(result)
    }

    /// Publish a carousel
    ///
    /// Size and caption are checked before credentials are loaded.
    pub async fn post_carousel(
        &self,
        explicit: &CredentialOverride,
        post: &CarouselPost,
    ) -> Result<PublishResult> {
        check_carousel_size(post.items.len())?;
        check_caption(post.caption.as_deref())?;
        let credentials = self.resolve_credentials(explicit).await?;
        let result = self.publisher.post_carousel(&credentials, post).await?;
        info!(
            "Carousel of {} items published as {}",
            post.items.len(),
            result.post_id
        );
        Ok(result)
    }

    /// Publish a Reel
    pub async fn post_reel(
        &self,
        explicit: &CredentialOverride,
        post: &ReelPost,
    ) -> Result<PublishResult> {
        check_caption(post.caption.as_deref())?;
        let credentials = self.resolve_credentials(explicit).await?;
        let result = self.publisher.post_reel(&credentials, post).await?;
        info!("Reel published as {}", result.post_id);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::MockCredentialProvider;
    use crate::error::{ApiErrorKind, InstagramError};
    use crate::types::CarouselItem;

    fn service(provider: MockCredentialProvider) -> InstagramService {
        let config = InstagramConfig::default();
        let publisher = InstagramPublisher::new(&config).unwrap();
        InstagramService::from_parts(config, publisher, Arc::new(provider))
    }

    #[tokio::test]
    async fn test_explicit_credentials_skip_provider() {
        let mut provider = MockCredentialProvider::new();
        provider.expect_load().times(0);

        let creds = service(provider)
            .resolve_credentials(&CredentialOverride::new("1784", "tok"))
            .await
            .unwrap();
        assert_eq!(creds, Credentials::new("1784", "tok"));
    }

    #[tokio::test]
    async fn test_stored_credentials_used() {
        let mut provider = MockCredentialProvider::new();
        provider
            .expect_load()
            .times(1)
            .returning(|| Ok(Some(Credentials::new("42", "stored"))));

        let creds = service(provider)
            .resolve_credentials(&CredentialOverride::default())
            .await
            .unwrap();
        assert_eq!(creds, Credentials::new("42", "stored"));
    }

    #[tokio::test]
    async fn test_partial_override_merges() {
        let mut provider = MockCredentialProvider::new();
        provider
            .expect_load()
            .times(1)
            .returning(|| Ok(Some(Credentials::new("42", "stored"))));

        let creds = service(provider)
            .resolve_credentials(&CredentialOverride {
                user_id: None,
                access_token: Some("fresh".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(creds, Credentials::new("42", "fresh"));
    }

    #[tokio::test]
    async fn test_blank_override_is_ignored() {
        let mut provider = MockCredentialProvider::new();
        provider.expect_load().times(1).returning(|| Ok(None));

        let err = service(provider)
            .resolve_credentials(&CredentialOverride::new(" ", ""))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(ApiErrorKind::InvalidRequest));
    }

    #[tokio::test]
    async fn test_store_error_propagates() {
        let mut provider = MockCredentialProvider::new();
        provider.expect_load().times(1).returning(|| {
            Err(InstagramError::Credentials(
                "missing required field `id`".to_string(),
            ))
        });

        let err = service(provider)
            .resolve_credentials(&CredentialOverride::default())
            .await
            .unwrap_err();
        assert!(matches!(err, InstagramError::Credentials(_)));
    }

    fn unused_provider() -> MockCredentialProvider {
        let mut provider = MockCredentialProvider::new();
        provider.expect_load().times(0);
        provider
    }

    #[tokio::test]
    async fn test_carousel_size_checked_before_credentials() {
        let post = CarouselPost {
            items: (0..11)
                .map(|i| CarouselItem::image(format!("https://cdn.example.com/{}.jpg", i)))
                .collect(),
            caption: None,
        };
        let err = service(unused_provider())
            .post_carousel(&CredentialOverride::default(), &post)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(ApiErrorKind::InvalidRequest));
    }

    #[tokio::test]
    async fn test_caption_checked_before_credentials() {
        let post = ReelPost {
            video_url: "https://cdn.example.com/reel.mp4".to_string(),
            caption: Some("a".repeat(crate::MAX_CAPTION_LENGTH + 1)),
            ..Default::default()
        };
        let err = service(unused_provider())
            .post_reel(&CredentialOverride::default(), &post)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(ApiErrorKind::InvalidRequest));
    }

    #[test]
    fn test_auth_url_requires_app_id() {
        let mut provider = MockCredentialProvider::new();
        provider.expect_load().times(0);
        let err = service(provider).auth_url().unwrap_err();
        assert!(matches!(err, InstagramError::MissingSetting(_)));
    }
}

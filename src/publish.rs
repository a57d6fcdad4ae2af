//! Publish orchestrators
//!
//! Every media kind follows create container → (poll, video only) → publish.
//! Steps run strictly in sequence; a failure aborts the pipeline and leaves
//! already-created containers to expire on the provider side.

use std::sync::Arc;

use tracing::info;

use crate::classify::{classify, Failure};
use crate::client::GraphClient;
use crate::config::InstagramConfig;
use crate::error::{ApiError, InstagramError, Result};
use crate::poller::{Clock, ContainerPoller, PollSettings, TokioClock};
use crate::types::{
    CarouselItemType, CarouselPost, Credentials, ImagePost, MediaKind, PublishResult, ReelPost,
};
use crate::validator::{HttpMediaProbe, MediaProbe, MediaValidator};
use crate::{MAX_CAPTION_LENGTH, MAX_CAROUSEL_ITEMS, MIN_CAROUSEL_ITEMS};

type Step<T> = std::result::Result<T, Failure>;

/// Runs the publish pipelines against the Graph API
#[derive(Clone)]
pub struct InstagramPublisher {
    graph: GraphClient,
    validator: MediaValidator,
    poller: ContainerPoller,
}

impl InstagramPublisher {
    /// Build a publisher with real HTTP, probe and clock
    pub fn new(config: &InstagramConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| InstagramError::ConfigError(format!("Failed to create client: {}", e)))?;

        Ok(Self::from_parts(
            GraphClient::with_http(http.clone(), config),
            Arc::new(HttpMediaProbe::new(http)),
            Arc::new(TokioClock::new()),
            PollSettings {
                max_wait: config.max_wait(),
                interval: config.poll_interval(),
            },
        ))
    }

    /// Build a publisher from explicit collaborators
    pub fn from_parts(
        graph: GraphClient,
        probe: Arc<dyn MediaProbe>,
        clock: Arc<dyn Clock>,
        settings: PollSettings,
    ) -> Self {
        Self {
            validator: MediaValidator::new(probe),
            poller: ContainerPoller::new(graph.clone(), clock, settings),
            graph,
        }
    }

    /// Replace the media probe (builder pattern)
    pub fn with_probe(mut self, probe: Arc<dyn MediaProbe>) -> Self {
        self.validator = MediaValidator::new(probe);
        self
    }

    /// Publish a single image
    pub async fn post_image(
        &self,
        credentials: &Credentials,
        post: &ImagePost,
    ) -> std::result::Result<PublishResult, ApiError> {
        self.run_image(credentials, post).await.map_err(classify)
    }

    /// Publish a carousel of 2-10 children
    pub async fn post_carousel(
        &self,
        credentials: &Credentials,
        post: &CarouselPost,
    ) -> std::result::Result<PublishResult, ApiError> {
        self.run_carousel(credentials, post).await.map_err(classify)
    }

    /// Publish a Reel
    pub async fn post_reel(
        &self,
        credentials: &Credentials,
        post: &ReelPost,
    ) -> std::result::Result<PublishResult, ApiError> {
        self.run_reel(credentials, post).await.map_err(classify)
    }

    async fn run_image(&self, credentials: &Credentials, post: &ImagePost) -> Step<PublishResult> {
        check_credentials(credentials)?;
        check_caption(post.caption.as_deref())?;
        self.validator.validate(&post.image_url).await?;

        let mut params = vec![("image_url", post.image_url.as_str())];
        if let Some(caption) = post.caption.as_deref() {
            params.push(("caption", caption));
        }

        let container = self
            .graph
            .create_container(
                &credentials.user_id,
                &credentials.access_token,
                MediaKind::Image,
                &params,
            )
            .await?;
        info!("Created image container {}", container.id);

        let post_id = self.publish(credentials, &container.id).await?;
        Ok(PublishResult {
            post_id,
            status: "Image posted successfully".to_string(),
        })
    }

    async fn run_carousel(
        &self,
        credentials: &Credentials,
        post: &CarouselPost,
    ) -> Step<PublishResult> {
        let count = post.items.len();
        check_carousel_size(count)?;
        check_credentials(credentials)?;
        check_caption(post.caption.as_deref())?;
        if let Some(position) = post.items.iter().position(|item| item.url.trim().is_empty()) {
            return Err(ApiError::invalid_request(format!(
                "Carousel item {} has an empty URL",
                position + 1
            ))
            .into());
        }

        let mut children = Vec::with_capacity(count);
        for (index, item) in post.items.iter().enumerate() {
            let (kind, params) = match item.item_type {
                CarouselItemType::Image => (
                    MediaKind::Image,
                    vec![("image_url", item.url.as_str()), ("is_carousel_item", "true")],
                ),
                CarouselItemType::Video => (
                    MediaKind::Video,
                    vec![
                        ("media_type", "VIDEO"),
                        ("video_url", item.url.as_str()),
                        ("is_carousel_item", "true"),
                    ],
                ),
            };

            let child = self
                .graph
                .create_container(
                    &credentials.user_id,
                    &credentials.access_token,
                    kind,
                    &params,
                )
                .await?;
            info!(
                "Created carousel child {}/{} ({}) container {}",
                index + 1,
                count,
                kind,
                child.id
            );

            if kind == MediaKind::Video {
                self.poller
                    .wait_until_ready(&credentials.access_token, &child.id)
                    .await?;
            }
            children.push(child.id);
        }

        let children = children.join(",");
        let mut params = vec![("media_type", "CAROUSEL"), ("children", children.as_str())];
        if let Some(caption) = post.caption.as_deref() {
            params.push(("caption", caption));
        }

        let parent = self
            .graph
            .create_container(
                &credentials.user_id,
                &credentials.access_token,
                MediaKind::Carousel,
                &params,
            )
            .await?;
        info!("Created carousel container {} with children {}", parent.id, children);

        let post_id = self.publish(credentials, &parent.id).await?;
        Ok(PublishResult {
            post_id,
            status: "Carousel posted successfully".to_string(),
        })
    }

    async fn run_reel(&self, credentials: &Credentials, post: &ReelPost) -> Step<PublishResult> {
        check_credentials(credentials)?;
        check_caption(post.caption.as_deref())?;
        if post.video_url.trim().is_empty() {
            return Err(ApiError::invalid_request("Video URL is required").into());
        }

        let share_to_feed = post.share_to_feed.map(|v| v.to_string());
        let mut params = vec![("media_type", "REELS"), ("video_url", post.video_url.as_str())];
        if let Some(cover_url) = post.cover_url.as_deref() {
            params.push(("cover_url", cover_url));
        }
        if let Some(caption) = post.caption.as_deref() {
            params.push(("caption", caption));
        }
        if let Some(share) = share_to_feed.as_deref() {
            params.push(("share_to_feed", share));
        }

        let container = self
            .graph
            .create_container(
                &credentials.user_id,
                &credentials.access_token,
                MediaKind::Video,
                &params,
            )
            .await?;
        info!("Created reel container {}, waiting for processing", container.id);

        self.poller
            .wait_until_ready(&credentials.access_token, &container.id)
            .await?;

        let post_id = self.publish(credentials, &container.id).await?;
        Ok(PublishResult {
            post_id,
            status: "Reel posted successfully".to_string(),
        })
    }

    async fn publish(&self, credentials: &Credentials, creation_id: &str) -> Step<String> {
        let post_id = self
            .graph
            .publish_container(&credentials.user_id, &credentials.access_token, creation_id)
            .await?;
        info!("Published container {} as media {}", creation_id, post_id);
        Ok(post_id)
    }
}

fn check_credentials(credentials: &Credentials) -> Step<()> {
    if credentials.user_id.trim().is_empty() {
        return Err(ApiError::invalid_request("Instagram user id is required").into());
    }
    if credentials.access_token.trim().is_empty() {
        return Err(ApiError::invalid_request("Access token is required").into());
    }
    Ok(())
}

/// Reject captions over `MAX_CAPTION_LENGTH` characters
pub(crate) fn check_caption(caption: Option<&str>) -> std::result::Result<(), ApiError> {
    let length = caption.map(|c| c.chars().count()).unwrap_or(0);
    if length > MAX_CAPTION_LENGTH {
        return Err(ApiError::invalid_request(format!(
            "Caption too long: {} characters (max: {})",
            length, MAX_CAPTION_LENGTH
        )));
    }
    Ok(())
}

/// Reject carousels outside `MIN_CAROUSEL_ITEMS..=MAX_CAROUSEL_ITEMS`
pub(crate) fn check_carousel_size(count: usize) -> std::result::Result<(), ApiError> {
    if !(MIN_CAROUSEL_ITEMS..=MAX_CAROUSEL_ITEMS).contains(&count) {
        return Err(ApiError::invalid_request(format!(
            "Carousel must contain between {} and {} items, got {}",
            MIN_CAROUSEL_ITEMS, MAX_CAROUSEL_ITEMS, count
        )));
    }
    Ok(())
}

//! Tool surface
//!
//! Argument schemas for the four tools and the transport-neutral
//! [`ToolResponse`] they produce. The MCP binding in [`crate::mcp`] only
//! converts these into protocol types.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info};

use crate::error::Result;
use crate::service::{CredentialOverride, InstagramService};
use crate::types::{CarouselItem, CarouselPost, ImagePost, PublishResult, ReelPost};

/// Authorization URL tool
pub const AUTH_TOOL: &str = "instagram-auth";
/// Single image tool
pub const POST_IMAGE_TOOL: &str = "instagram-post-image";
/// Carousel tool
pub const POST_CAROUSEL_TOOL: &str = "instagram-post-carousel";
/// Reel tool
pub const POST_REEL_TOOL: &str = "instagram-post-reel";

/// Names of every tool, in listing order
pub const TOOL_NAMES: [&str; 4] = [
    AUTH_TOOL,
    POST_IMAGE_TOOL,
    POST_CAROUSEL_TOOL,
    POST_REEL_TOOL,
];

/// Arguments of `instagram-post-image`
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostImageArgs {
    /// Public HTTPS URL of a JPEG image
    pub image_url: String,
    /// Post caption (at most 2200 characters)
    #[serde(default)]
    pub caption: Option<String>,
    /// Access token; the stored account is used when omitted
    #[serde(default)]
    pub user_access_token: Option<String>,
    /// Instagram Business user id; the stored account is used when omitted
    #[serde(default)]
    pub ig_user_id: Option<String>,
}

/// Arguments of `instagram-post-carousel`
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostCarouselArgs {
    /// Between 2 and 10 images or videos, in display order
    pub media_items: Vec<CarouselItem>,
    /// Post caption (at most 2200 characters)
    #[serde(default)]
    pub caption: Option<String>,
    /// Access token; the stored account is used when omitted
    #[serde(default)]
    pub user_access_token: Option<String>,
    /// Instagram Business user id; the stored account is used when omitted
    #[serde(default)]
    pub ig_user_id: Option<String>,
}

/// Arguments of `instagram-post-reel`
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostReelArgs {
    /// Public URL of the video
    pub video_url: String,
    /// Post caption (at most 2200 characters)
    #[serde(default)]
    pub caption: Option<String>,
    /// Cover image URL
    #[serde(default)]
    pub cover_url: Option<String>,
    /// Also show the Reel in the profile feed
    #[serde(default)]
    pub share_to_feed: Option<bool>,
    /// Access token; the stored account is used when omitted
    #[serde(default)]
    pub user_access_token: Option<String>,
    /// Instagram Business user id; the stored account is used when omitted
    #[serde(default)]
    pub ig_user_id: Option<String>,
}

fn override_from(user_id: Option<String>, access_token: Option<String>) -> CredentialOverride {
    CredentialOverride {
        user_id,
        access_token,
    }
}

/// Content block of a tool response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    /// Plain text
    Text {
        /// The text
        text: String,
    },
}

/// Result of one tool invocation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResponse {
    /// Human-readable content
    pub content: Vec<ToolContent>,
    /// Structured result on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    /// Set on failure
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl ToolResponse {
    /// Successful response
    pub fn success(text: impl Into<String>, output: Option<Value>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
            output,
            is_error: false,
        }
    }

    /// Failed response
    pub fn failure(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
            output: None,
            is_error: true,
        }
    }

    /// Concatenated text content
    pub fn text(&self) -> String {
        self.content
            .iter()
            .map(|c| match c {
                ToolContent::Text { text } => text.as_str(),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn publish_response(tool: &str, result: Result<PublishResult>) -> ToolResponse {
    match result {
        Ok(result) => {
            info!(tool, post_id = %result.post_id, "Tool succeeded");
            let text = format!("{} (post id {})", result.status, result.post_id);
            ToolResponse::success(text, serde_json::to_value(&result).ok())
        }
        Err(e) => {
            error!(tool, "Tool failed: {}", e.describe());
            ToolResponse::failure(e.describe())
        }
    }
}

/// `instagram-auth`
pub fn auth(service: &InstagramService) -> ToolResponse {
    match service.auth_url() {
        Ok(url) => {
            let text = format!(
                "Open this URL to connect your Instagram account: {}",
                url.auth_url
            );
            ToolResponse::success(text, serde_json::to_value(&url).ok())
        }
        Err(e) => {
            error!(tool = AUTH_TOOL, "Tool failed: {}", e.describe());
            ToolResponse::failure(e.describe())
        }
    }
}

/// `instagram-post-image`
pub async fn post_image(service: &InstagramService, args: PostImageArgs) -> ToolResponse {
    let explicit = override_from(args.ig_user_id, args.user_access_token);
    let post = ImagePost {
        image_url: args.image_url,
        caption: args.caption,
    };
    publish_response(POST_IMAGE_TOOL, service.post_image(&explicit, &post).await)
}

/// `instagram-post-carousel`
pub async fn post_carousel(service: &InstagramService, args: PostCarouselArgs) -> ToolResponse {
    let explicit = override_from(args.ig_user_id, args.user_access_token);
    let post = CarouselPost {
        items: args.media_items,
        caption: args.caption,
    };
    publish_response(
        POST_CAROUSEL_TOOL,
        service.post_carousel(&explicit, &post).await,
    )
}

/// `instagram-post-reel`
pub async fn post_reel(service: &InstagramService, args: PostReelArgs) -> ToolResponse {
    let explicit = override_from(args.ig_user_id, args.user_access_token);
    let post = ReelPost {
        video_url: args.video_url,
        caption: args.caption,
        cover_url: args.cover_url,
        share_to_feed: args.share_to_feed,
    };
    publish_response(POST_REEL_TOOL, service.post_reel(&explicit, &post).await)
}

//! Type definitions for the Instagram publishing pipeline
//!
//! Strong types with validation - no unknown or any types.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a media container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MediaKind {
    /// Single image
    Image,
    /// Video (Reel or carousel child)
    Video,
    /// Carousel parent
    Carousel,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Image => "IMAGE",
            Self::Video => "VIDEO",
            Self::Carousel => "CAROUSEL",
        };
        write!(f, "{}", s)
    }
}

/// Processing status reported for a media container
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerStatus {
    /// Still processing
    InProgress,
    /// Ready to publish
    Finished,
    /// Already published
    Published,
    /// Processing failed
    Error,
    /// Container was not published within its lifetime
    Expired,
    /// Any other value, treated as still pending
    Unknown(String),
}

impl ContainerStatus {
    /// Parse a provider `status_code` value
    pub fn parse(raw: &str) -> Self {
        match raw {
            "IN_PROGRESS" => Self::InProgress,
            "FINISHED" => Self::Finished,
            "PUBLISHED" => Self::Published,
            "ERROR" => Self::Error,
            "EXPIRED" => Self::Expired,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Whether the container failed for good
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Error | Self::Expired)
    }
}

impl fmt::Display for ContainerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InProgress => write!(f, "IN_PROGRESS"),
            Self::Finished => write!(f, "FINISHED"),
            Self::Published => write!(f, "PUBLISHED"),
            Self::Error => write!(f, "ERROR"),
            Self::Expired => write!(f, "EXPIRED"),
            Self::Unknown(raw) => write!(f, "{}", raw),
        }
    }
}

/// Provider-side staging resource awaiting publication
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaContainer {
    /// Instagram-assigned container id (the creation id)
    pub id: String,
    /// Kind of media held by the container
    pub kind: MediaKind,
    /// Last observed status
    pub status: ContainerStatus,
    /// Account the container belongs to
    pub owner_user_id: String,
}

/// Account credentials used to act on behalf of a user
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Instagram user id
    pub user_id: String,
    /// Access token
    pub access_token: String,
}

impl Credentials {
    /// Create credentials
    pub fn new(user_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            access_token: access_token.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user_id", &self.user_id)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

/// Single image post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagePost {
    /// Public HTTPS URL of a JPEG image
    pub image_url: String,
    /// Optional caption
    pub caption: Option<String>,
}

/// Type of a carousel child
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CarouselItemType {
    /// Image child
    Image,
    /// Video child
    Video,
}

/// One carousel child
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CarouselItem {
    /// Child type
    #[serde(rename = "type")]
    pub item_type: CarouselItemType,
    /// Public media URL
    pub url: String,
}

impl CarouselItem {
    /// Image child
    pub fn image(url: impl Into<String>) -> Self {
        Self {
            item_type: CarouselItemType::Image,
            url: url.into(),
        }
    }

    /// Video child
    pub fn video(url: impl Into<String>) -> Self {
        Self {
            item_type: CarouselItemType::Video,
            url: url.into(),
        }
    }
}

/// Carousel post (2-10 ordered children)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarouselPost {
    /// Children in publish order
    pub items: Vec<CarouselItem>,
    /// Optional caption
    pub caption: Option<String>,
}

/// Reel post
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReelPost {
    /// Public video URL
    pub video_url: String,
    /// Optional caption
    pub caption: Option<String>,
    /// Optional cover image URL
    pub cover_url: Option<String>,
    /// Whether the Reel also appears in the feed
    pub share_to_feed: Option<bool>,
}

/// Outcome of a successful publish
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishResult {
    /// Instagram media id of the published post
    pub post_id: String,
    /// Human-readable status
    pub status: String,
}

/// Generated authorization link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationUrl {
    /// URL the account owner opens to grant access
    pub auth_url: String,
}

//! elizaOS Instagram publishing tools
//!
//! Publishes images, carousels and Reels to an Instagram Business account
//! through the Instagram Graph API, and exposes the operations as MCP tools.
//!
//! Every upload follows the provider's container pipeline:
//! create container → (wait for processing, video only) → publish container.
//!
//! # Example
//!
//! ```no_run
//! use elizaos_instagram_mcp::{Credentials, ImagePost, InstagramConfig, InstagramPublisher};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = InstagramConfig::from_env().expect("Invalid Instagram configuration");
//!     let publisher = InstagramPublisher::new(&config).expect("Failed to build publisher");
//!     let credentials = Credentials::new("17841400000000000", "IGAA...");
//!
//!     let result = publisher
//!         .post_image(
//!             &credentials,
//!             &ImagePost {
//!                 image_url: "https://cdn.example.com/photo.jpg".to_string(),
//!                 caption: Some("Hello from elizaOS".to_string()),
//!             },
//!         )
//!         .await
//!         .expect("Publish failed");
//!     println!("Published {}", result.post_id);
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod auth;
pub mod callback;
pub mod classify;
pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod mcp;
pub mod poller;
pub mod publish;
pub mod service;
pub mod tools;
pub mod types;
pub mod validator;

// Re-exports for convenience
pub use classify::{classify, Failure};
pub use client::GraphClient;
pub use config::InstagramConfig;
pub use credentials::{
    CredentialProvider, FileCredentialStore, StaticCredentials, StoredCredentials,
};
pub use error::{ApiError, ApiErrorKind, InstagramError, Result};
pub use poller::{Clock, ContainerPoller, PollSettings, TokioClock};
pub use publish::InstagramPublisher;
pub use service::InstagramService;
pub use types::*;
pub use validator::{HttpMediaProbe, MediaProbe, MediaValidator, ProbeResponse};

/// Service name reported to MCP clients and the health endpoint
pub const SERVICE_NAME: &str = "instagram-mcp";
/// Crate version matching Cargo.toml
pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default Graph API host
pub const DEFAULT_GRAPH_URL: &str = "https://graph.instagram.com";
/// Default OAuth API host
pub const DEFAULT_OAUTH_URL: &str = "https://api.instagram.com";
/// Default authorization dialog
pub const DEFAULT_AUTHORIZE_URL: &str = "https://www.instagram.com/oauth/authorize";
/// Graph API version used for every call
pub const DEFAULT_API_VERSION: &str = "v19.0";
/// Permissions requested during authorization
pub const DEFAULT_SCOPES: &[&str] = &[
    "instagram_business_basic",
    "instagram_business_content_publish",
];

/// Readiness poll interval in milliseconds
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 3_000;
/// Readiness poll deadline in milliseconds
pub const DEFAULT_MAX_WAIT_MS: u64 = 60_000;

/// Maximum caption length for Instagram posts
pub const MAX_CAPTION_LENGTH: usize = 2200;
/// Minimum number of carousel children
pub const MIN_CAROUSEL_ITEMS: usize = 2;
/// Maximum number of carousel children
pub const MAX_CAROUSEL_ITEMS: usize = 10;

//! MCP server
//!
//! Registers the four tools with rmcp and serves them over stdio.

use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content, Implementation, ServerCapabilities, ServerInfo};
use rmcp::transport::stdio;
use rmcp::ErrorData as McpError;
use rmcp::{tool, tool_handler, tool_router, ServerHandler, ServiceExt};
use tracing::info;

use crate::error::InstagramError;
use crate::service::InstagramService;
use crate::tools::{self, PostCarouselArgs, PostImageArgs, PostReelArgs, ToolContent, ToolResponse};

/// MCP server state
#[derive(Clone)]
pub struct InstagramMcp {
    service: Arc<InstagramService>,
    tool_router: ToolRouter<InstagramMcp>,
}

impl InstagramMcp {
    /// Create a server backed by `service`
    pub fn new(service: Arc<InstagramService>) -> Self {
        Self {
            service,
            tool_router: Self::tool_router(),
        }
    }
}

#[tool_router]
impl InstagramMcp {
    #[tool(
        name = "instagram-auth",
        description = "Generate the Instagram authorization URL used to connect a Business account"
    )]
    async fn auth(&self) -> Result<CallToolResult, McpError> {
        Ok(into_call_result(tools::auth(&self.service)))
    }

    #[tool(
        name = "instagram-post-image",
        description = "Publish a single JPEG image from a public HTTPS URL to Instagram"
    )]
    async fn post_image(
        &self,
        Parameters(args): Parameters<PostImageArgs>,
    ) -> Result<CallToolResult, McpError> {
        Ok(into_call_result(tools::post_image(&self.service, args).await))
    }

    #[tool(
        name = "instagram-post-carousel",
        description = "Publish a carousel of 2 to 10 images or videos to Instagram"
    )]
    async fn post_carousel(
        &self,
        Parameters(args): Parameters<PostCarouselArgs>,
    ) -> Result<CallToolResult, McpError> {
        Ok(into_call_result(
            tools::post_carousel(&self.service, args).await,
        ))
    }

    #[tool(
        name = "instagram-post-reel",
        description = "Publish a Reel from a public video URL, waiting for Instagram to process it"
    )]
    async fn post_reel(
        &self,
        Parameters(args): Parameters<PostReelArgs>,
    ) -> Result<CallToolResult, McpError> {
        Ok(into_call_result(tools::post_reel(&self.service, args).await))
    }
}

#[tool_handler]
impl ServerHandler for InstagramMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "Instagram publishing tools. Run instagram-auth once to connect a Business \
                 account, or pass userAccessToken and igUserId with each post."
                    .to_string(),
            ),
            ..Default::default()
        }
    }
}

fn into_call_result(response: ToolResponse) -> CallToolResult {
    let content = response
        .content
        .into_iter()
        .map(|c| match c {
            ToolContent::Text { text } => Content::text(text),
        })
        .collect();

    let mut result = if response.is_error {
        CallToolResult::error(content)
    } else {
        CallToolResult::success(content)
    };
    result.structured_content = response.output;
    result
}

/// Serve the tools over stdin/stdout until the client disconnects
pub async fn serve_stdio(service: Arc<InstagramService>) -> crate::error::Result<()> {
    info!("Starting Instagram MCP server on stdio");
    let running = InstagramMcp::new(service)
        .serve(stdio())
        .await
        .map_err(|e| InstagramError::Server(format!("MCP initialization failed: {}", e)))?;

    let reason = running
        .waiting()
        .await
        .map_err(|e| InstagramError::Server(format!("MCP server task failed: {}", e)))?;
    info!("MCP server stopped: {:?}", reason);
    Ok(())
}

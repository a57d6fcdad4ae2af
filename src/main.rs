//! Instagram MCP server CLI
//!
//! `serve` (default) speaks MCP over stdio; `callback` runs the OAuth
//! redirect target that stores the connected account's token.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use elizaos_instagram_mcp::auth::OAuthClient;
use elizaos_instagram_mcp::callback::{self, CallbackState};
use elizaos_instagram_mcp::{
    mcp, FileCredentialStore, InstagramConfig, InstagramService, SERVICE_VERSION,
};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "instagram-mcp")]
#[command(author = "elizaOS")]
#[command(version = SERVICE_VERSION)]
#[command(about = "Instagram publishing tools over the Model Context Protocol", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the Instagram tools over stdio
    Serve {
        /// Also expose GET /health on this port
        #[arg(long, env = "HEALTH_PORT")]
        health_port: Option<u16>,
    },

    /// Run the OAuth callback server
    Callback {
        /// Port to listen on
        #[arg(long, env = "CALLBACK_PORT", default_value_t = 3000)]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    // stdout carries MCP frames, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = InstagramConfig::from_env().context("Invalid Instagram configuration")?;

    let command = cli.command.unwrap_or_else(|| Commands::Serve {
        health_port: std::env::var("HEALTH_PORT").ok().and_then(|p| p.parse().ok()),
    });
    match command {
        Commands::Serve { health_port } => serve(config, health_port).await,
        Commands::Callback { port } => run_callback(config, port).await,
    }
}

async fn serve(config: InstagramConfig, health_port: Option<u16>) -> Result<()> {
    if let Some(port) = health_port {
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        tokio::spawn(async move {
            if let Err(e) = callback::serve(addr, callback::health_router()).await {
                error!("Health endpoint stopped: {}", e);
            }
        });
    }

    let service = InstagramService::new(config).context("Failed to create Instagram service")?;
    mcp::serve_stdio(Arc::new(service)).await?;
    Ok(())
}

async fn run_callback(config: InstagramConfig, port: u16) -> Result<()> {
    config
        .require_app_id()
        .and_then(|_| config.require_app_secret())
        .context("The callback server needs the app credentials")?;

    info!("Redirect URI: {}", config.redirect_uri);
    let store = FileCredentialStore::new(config.credentials_path.clone());
    let oauth = OAuthClient::new(config).context("Failed to create OAuth client")?;
    let app = callback::router(CallbackState::new(oauth, store));

    callback::serve(SocketAddr::from(([0, 0, 0, 0], port)), app).await?;
    Ok(())
}

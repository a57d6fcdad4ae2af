//! OAuth callback and health endpoints
//!
//! `GET /auth/callback` completes the authorization flow started by the
//! `instagram-auth` tool and persists the long-lived token. `GET /health`
//! answers liveness probes. Plain HTTP only; terminate TLS in front of it.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::auth::OAuthClient;
use crate::credentials::FileCredentialStore;
use crate::error::{InstagramError, Result};
use crate::{SERVICE_NAME, SERVICE_VERSION};

/// Shared state of the callback handler
#[derive(Clone)]
pub struct CallbackState {
    oauth: Arc<OAuthClient>,
    store: Arc<FileCredentialStore>,
}

impl CallbackState {
    /// Create the state
    pub fn new(oauth: OAuthClient, store: FileCredentialStore) -> Self {
        Self {
            oauth: Arc::new(oauth),
            store: Arc::new(store),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CallbackParams {
    code: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
}

/// GET /health
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: SERVICE_NAME,
        version: SERVICE_VERSION,
    })
}

/// GET /auth/callback
async fn auth_callback(
    State(state): State<CallbackState>,
    Query(params): Query<CallbackParams>,
) -> Response {
    if let Some(reason) = params.error {
        let detail = params.error_description.unwrap_or_default();
        warn!("Authorization denied: {} {}", reason, detail);
        let body = if detail.is_empty() {
            format!("Authorization failed: {}", reason)
        } else {
            format!("Authorization failed: {} ({})", reason, detail)
        };
        return (StatusCode::BAD_REQUEST, body).into_response();
    }

    let Some(code) = params.code.filter(|c| !c.trim().is_empty()) else {
        return (StatusCode::BAD_REQUEST, "Missing authorization code").into_response();
    };

    let record = match state.oauth.exchange_code(&code).await {
        Ok(record) => record,
        Err(e) => {
            error!("Token exchange failed: {}", e.describe());
            let status = match e {
                InstagramError::Api(_) => StatusCode::BAD_GATEWAY,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            return (status, e.describe()).into_response();
        }
    };

    if let Err(e) = state.store.save(&record).await {
        error!("Failed to save credentials: {}", e);
        return (StatusCode::INTERNAL_SERVER_ERROR, e.describe()).into_response();
    }

    info!("Instagram account connected");
    (
        StatusCode::OK,
        "Instagram account connected. You can close this window.",
    )
        .into_response()
}

fn health_routes() -> Router {
    Router::new().route("/health", get(health))
}

/// Router exposing only `/health`
pub fn health_router() -> Router {
    health_routes().layer(TraceLayer::new_for_http())
}

/// Router exposing `/auth/callback` and `/health`
pub fn router(state: CallbackState) -> Router {
    Router::new()
        .route("/auth/callback", get(auth_callback))
        .with_state(state)
        .merge(health_routes())
        .layer(TraceLayer::new_for_http())
}

/// Bind `addr` and serve `app` until Ctrl-C
pub async fn serve(addr: SocketAddr, app: Router) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .map_err(|e| InstagramError::Server(e.to_string()))
}

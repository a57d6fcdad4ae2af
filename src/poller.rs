//! Container readiness polling for video media
//!
//! Fixed-interval polling against a wall-clock deadline. `FINISHED` ends the
//! wait, `ERROR`/`EXPIRED` fail it, every other status keeps it going.
//! `NETWORK_ERROR` while polling is transient; any other error is fatal.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::client::GraphClient;
use crate::error::{ApiError, ApiErrorKind};
use crate::types::ContainerStatus;

/// Time source and sleeper used by the poller
#[async_trait]
pub trait Clock: Send + Sync {
    /// Monotonic time since an arbitrary origin
    fn now(&self) -> Duration;

    /// Suspend the caller for `duration`
    async fn sleep(&self, duration: Duration);
}

/// [`Clock`] backed by the tokio timer
#[derive(Debug, Clone)]
pub struct TokioClock {
    origin: tokio::time::Instant,
}

impl TokioClock {
    /// Start a clock at the current instant
    pub fn new() -> Self {
        Self {
            origin: tokio::time::Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Polling parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    /// Give up once this much time has elapsed
    pub max_wait: Duration,
    /// Pause between attempts
    pub interval: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            max_wait: Duration::from_millis(crate::DEFAULT_MAX_WAIT_MS),
            interval: Duration::from_millis(crate::DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

/// Waits for a container to finish processing
#[derive(Clone)]
pub struct ContainerPoller {
    graph: GraphClient,
    clock: Arc<dyn Clock>,
    settings: PollSettings,
}

impl ContainerPoller {
    /// Create a poller
    pub fn new(graph: GraphClient, clock: Arc<dyn Clock>, settings: PollSettings) -> Self {
        Self {
            graph,
            clock,
            settings,
        }
    }

    /// Wait with the configured settings
    pub async fn wait_until_ready(
        &self,
        access_token: &str,
        container_id: &str,
    ) -> Result<(), ApiError> {
        self.wait_until_ready_with(access_token, container_id, self.settings)
            .await
    }

    /// Wait with explicit settings
    pub async fn wait_until_ready_with(
        &self,
        access_token: &str,
        container_id: &str,
        settings: PollSettings,
    ) -> Result<(), ApiError> {
        let started = self.clock.now();
        let mut attempts: u32 = 0;

        while self.clock.now().saturating_sub(started) < settings.max_wait {
            attempts += 1;
            match self.graph.container_status(access_token, container_id).await {
                Ok(ContainerStatus::Finished) => {
                    info!(
                        "Container {} ready after {} poll(s)",
                        container_id, attempts
                    );
                    return Ok(());
                }
                Ok(status) if status.is_failure() => {
                    return Err(ApiError::invalid_request(format!(
                        "Media container {} failed processing with status {}",
                        container_id, status
                    )));
                }
                Ok(status) => {
                    debug!(
                        "Container {} status {} (attempt {})",
                        container_id, status, attempts
                    );
                }
                Err(err) if err.kind == ApiErrorKind::NetworkError => {
                    warn!(
                        "Transient error polling container {} (attempt {}): {}",
                        container_id, attempts, err
                    );
                }
                Err(err) => return Err(err),
            }

            self.clock.sleep(settings.interval).await;
        }

        Err(ApiError::unknown(format!(
            "Media processing timed out after {}ms waiting for container {}",
            settings.max_wait.as_millis(),
            container_id
        )))
    }
}

//! Gateway service boundary
//!
//! The poller and supervisor depend on this trait rather than the concrete
//! HTTP client, so tests can inject scripted gateways and failure modes.

use anyhow::Result;
use async_trait::async_trait;

use cadenza_client::GatewayClient;
use cadenza_core::domain::track::Track;
use cadenza_core::dto::save::{SaveKind, SaveResponse};
use cadenza_core::dto::status::StatusResponse;

/// The two external calls the tracker core needs
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Polls the upstream status of one generation task
    async fn poll_status(&self, task_id: &str) -> Result<StatusResponse>;

    /// Persists the merged tracks for one generation task
    async fn save_result(
        &self,
        task_id: &str,
        tracks: &[Track],
        kind: SaveKind,
    ) -> Result<SaveResponse>;
}

#[async_trait]
impl Gateway for GatewayClient {
    async fn poll_status(&self, task_id: &str) -> Result<StatusResponse> {
        Ok(GatewayClient::poll_status(self, task_id).await?)
    }

    async fn save_result(
        &self,
        task_id: &str,
        tracks: &[Track],
        kind: SaveKind,
    ) -> Result<SaveResponse> {
        Ok(GatewayClient::save_result(self, task_id, tracks, kind).await?)
    }
}

//! Save-result endpoint

use tracing::debug;

use crate::GatewayClient;
use crate::error::Result;
use cadenza_core::domain::track::Track;
use cadenza_core::dto::save::{SaveKind, SaveRequest, SaveResponse};

impl GatewayClient {
    /// Persist tracks for a generation task
    ///
    /// The persistence layer is idempotent by external id, so re-sending
    /// already-saved tracks is harmless; `tracks_count` in the response is
    /// the number actually written this time.
    ///
    /// # Arguments
    /// * `task_id` - The upstream correlation key of the task
    /// * `tracks` - The merged tracks known so far
    /// * `kind` - Whether this is a partial or final save
    pub async fn save_result(
        &self,
        task_id: &str,
        tracks: &[Track],
        kind: SaveKind,
    ) -> Result<SaveResponse> {
        let url = format!("{}/api/generation/save-tracks", self.base_url());
        debug!(
            "Saving {} track(s) for task {} ({:?})",
            tracks.len(),
            task_id,
            kind
        );
        let request = SaveRequest {
            task_id: task_id.to_string(),
            tracks: tracks.to_vec(),
            kind,
        };
        let response = self.client.post(&url).json(&request).send().await?;

        self.handle_response(response).await
    }
}

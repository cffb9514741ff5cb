//! Status polling endpoint

use tracing::debug;

use crate::GatewayClient;
use crate::error::Result;
use cadenza_core::dto::status::StatusResponse;

impl GatewayClient {
    /// Poll the current status of a generation task
    ///
    /// Non-2xx responses and transport errors surface as `ClientError`; the
    /// poller treats all of them as transient.
    ///
    /// # Arguments
    /// * `task_id` - The upstream correlation key of the task
    ///
    /// # Returns
    /// The raw status string and whatever partial tracks are known upstream
    pub async fn poll_status(&self, task_id: &str) -> Result<StatusResponse> {
        let url = format!("{}/api/generation/status", self.base_url());
        debug!("Polling status for task {}", task_id);
        let response = self
            .client
            .get(&url)
            .query(&[("taskId", task_id)])
            .header("Cache-Control", "no-store")
            .send()
            .await?;

        self.handle_response(response).await
    }
}

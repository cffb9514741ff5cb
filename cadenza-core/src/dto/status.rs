//! Status polling DTOs

use serde::{Deserialize, Serialize};

use crate::domain::track::Track;

/// Response from the status proxy for one generation task
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub task_id: String,
    /// Raw status code; normalized via [`crate::domain::upstream::UpstreamStatus::parse`]
    pub status: String,
    #[serde(default)]
    pub tracks: Vec<Track>,
}

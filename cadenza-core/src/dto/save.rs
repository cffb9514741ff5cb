//! Save-result DTOs

use serde::{Deserialize, Serialize};

use crate::domain::track::Track;

/// Whether a save persists an intermediate or final result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveKind {
    /// Non-terminal persistence of whatever tracks are known so far
    Partial,
    /// Final persistence once the job is judged complete
    Completed,
}

/// Request body for the internal persistence API
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRequest {
    pub task_id: String,
    pub tracks: Vec<Track>,
    pub kind: SaveKind,
}

/// Response from the internal persistence API
///
/// The persistence layer de-duplicates by external id, so `tracks_count`
/// may legitimately be zero on a re-save of already-persisted tracks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveResponse {
    pub success: bool,
    #[serde(default)]
    pub tracks_count: u32,
}

//! Track domain types

use serde::{Deserialize, Serialize};

/// A partial or final track result returned by the generation provider
///
/// Early polls may omit most fields (including the external id), so every
/// field is optional and later polls enrich earlier ones via the merge engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    /// Provider-assigned id; may be absent on the very first poll
    #[serde(default)]
    pub external_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub audio_url: Option<String>,
    #[serde(default)]
    pub stream_url: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub duration_seconds: Option<f64>,
    /// Opaque provider metadata, carried through untouched
    #[serde(default)]
    pub raw: serde_json::Value,
}

impl Track {
    /// Identity key used to de-duplicate tracks across polls
    ///
    /// Tie-break order: external id if present, else title. Anonymous tracks
    /// carry no intrinsic identity, so they are keyed by their ordinal among
    /// the anonymous entries of their payload; unlike an absolute position,
    /// that ordinal does not shift when identified tracks land around them,
    /// so the key stays stable from one merge to the next.
    pub fn identity(&self, anon_ordinal: usize) -> String {
        if let Some(id) = non_empty(&self.external_id) {
            return format!("id:{id}");
        }
        if let Some(title) = non_empty(&self.title) {
            return format!("title:{title}");
        }
        format!("anon:{anon_ordinal}")
    }

    /// Returns true when the track has neither an external id nor a title
    pub fn is_anonymous(&self) -> bool {
        non_empty(&self.external_id).is_none() && non_empty(&self.title).is_none()
    }
}

impl Default for Track {
    fn default() -> Self {
        Self {
            external_id: None,
            title: None,
            audio_url: None,
            stream_url: None,
            image_url: None,
            duration_seconds: None,
            raw: serde_json::Value::Null,
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

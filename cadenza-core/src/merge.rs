//! Merge engine
//!
//! Combines two ordered collections of partial track results into one
//! de-duplicated collection keyed by identity. Incoming fields overwrite
//! stored ones only when non-empty; a merge never removes a known track.
//! Pure, deterministic, idempotent: `merge(&merge(a, b), b) == merge(a, b)`.

use std::collections::HashMap;

use crate::domain::track::Track;

/// Merges `incoming` partial results over `previous`, keyed by track identity
///
/// The result preserves first-seen order. Duplicate identities within either
/// input are collapsed, with later occurrences enriching earlier ones.
pub fn merge(previous: &[Track], incoming: &[Track]) -> Vec<Track> {
    let mut order: Vec<String> = Vec::new();
    let mut by_key: HashMap<String, Track> = HashMap::new();

    for batch in [previous, incoming] {
        // Anonymous tracks are keyed by their ordinal among the anonymous
        // entries of their own batch. The previous list keeps anonymous
        // tracks in first-seen order, so an incoming anonymous track always
        // lands on the same stored slot regardless of how many identified
        // tracks sit around it, and re-merging a payload is a no-op.
        let mut anonymous = 0;
        for track in batch {
            let key = track.identity(anonymous);
            if track.is_anonymous() {
                anonymous += 1;
            }
            match by_key.get_mut(&key) {
                Some(existing) => overlay(existing, track),
                None => {
                    order.push(key.clone());
                    by_key.insert(key, track.clone());
                }
            }
        }
    }

    order
        .into_iter()
        .filter_map(|key| by_key.remove(&key))
        .collect()
}

/// Overwrites each field of `target` with the corresponding field of
/// `incoming` when the incoming value is present and non-empty
fn overlay(target: &mut Track, incoming: &Track) {
    overlay_string(&mut target.external_id, &incoming.external_id);
    overlay_string(&mut target.title, &incoming.title);
    overlay_string(&mut target.audio_url, &incoming.audio_url);
    overlay_string(&mut target.stream_url, &incoming.stream_url);
    overlay_string(&mut target.image_url, &incoming.image_url);
    if incoming.duration_seconds.is_some() {
        target.duration_seconds = incoming.duration_seconds;
    }
    if !incoming.raw.is_null() {
        target.raw = incoming.raw.clone();
    }
}

fn overlay_string(target: &mut Option<String>, incoming: &Option<String>) {
    if let Some(value) = incoming.as_deref()
        && !value.trim().is_empty()
    {
        *target = Some(value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(id: Option<&str>, title: Option<&str>, audio: Option<&str>) -> Track {
        Track {
            external_id: id.map(String::from),
            title: title.map(String::from),
            audio_url: audio.map(String::from),
            ..Track::default()
        }
    }

    #[test]
    fn test_merge_is_idempotent() {
        let a = vec![track(Some("1"), Some("One"), None)];
        let b = vec![
            track(Some("1"), None, Some("http://a/1.mp3")),
            track(Some("2"), Some("Two"), None),
        ];
        let once = merge(&a, &b);
        let twice = merge(&once, &b);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_merge_never_drops_tracks() {
        let a = vec![
            track(Some("1"), Some("One"), None),
            track(Some("2"), Some("Two"), None),
        ];
        let b = vec![track(Some("3"), Some("Three"), None)];
        let merged = merge(&a, &b);
        assert!(merged.len() >= a.len());
        assert_eq!(merged.len(), 3);
    }

    #[test]
    fn test_incoming_enriches_without_clobbering() {
        let a = vec![track(Some("1"), Some("Keep me"), Some("http://a/old.mp3"))];
        let b = vec![track(Some("1"), None, Some("http://a/new.mp3"))];
        let merged = merge(&a, &b);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].title.as_deref(), Some("Keep me"));
        assert_eq!(merged[0].audio_url.as_deref(), Some("http://a/new.mp3"));
    }

    #[test]
    fn test_empty_incoming_field_retains_stored_value() {
        let a = vec![track(Some("1"), Some("Title"), None)];
        let b = vec![track(Some("1"), Some("   "), None)];
        let merged = merge(&a, &b);
        assert_eq!(merged[0].title.as_deref(), Some("Title"));
    }

    #[test]
    fn test_first_seen_order_is_preserved() {
        let a = vec![track(Some("2"), None, None), track(Some("1"), None, None)];
        let b = vec![track(Some("1"), Some("One"), None), track(Some("3"), None, None)];
        let merged = merge(&a, &b);
        let ids: Vec<_> = merged.iter().map(|t| t.external_id.as_deref().unwrap()).collect();
        assert_eq!(ids, vec!["2", "1", "3"]);
    }

    #[test]
    fn test_anonymous_tracks_enrich_in_order() {
        // First poll carries an id-less, title-less stub; the next poll's
        // first anonymous entry fills it in rather than duplicating it.
        let a = vec![track(None, None, None)];
        let b = vec![track(None, None, Some("http://a/0.mp3"))];
        let merged = merge(&a, &b);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].audio_url.as_deref(), Some("http://a/0.mp3"));
    }

    #[test]
    fn test_merge_is_idempotent_with_anonymous_track_behind_identified() {
        // The anonymous track sits at index 0 of its payload but index 2 of
        // the merged output; its key must not depend on that shift, or the
        // re-merge would insert it a second time.
        let a = vec![
            track(Some("1"), Some("One"), None),
            track(Some("2"), Some("Two"), None),
        ];
        let b = vec![track(None, None, Some("http://a/x.mp3"))];
        let once = merge(&a, &b);
        assert_eq!(once.len(), 3);
        let twice = merge(&once, &b);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_anonymous_ordinal_skips_identified_neighbors() {
        // Second anonymous entry of a mixed payload matches the second
        // stored anonymous slot, not whatever sits at its absolute index.
        let a = vec![
            track(None, None, Some("http://a/first.mp3")),
            track(Some("1"), Some("One"), None),
            track(None, None, None),
        ];
        let b = vec![
            track(None, None, None),
            track(None, None, Some("http://a/second.mp3")),
        ];
        let merged = merge(&a, &b);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0].audio_url.as_deref(), Some("http://a/first.mp3"));
        assert_eq!(merged[2].audio_url.as_deref(), Some("http://a/second.mp3"));
    }

    #[test]
    fn test_duplicate_identities_in_one_payload_collapse() {
        let payload = vec![
            track(Some("1"), Some("One"), None),
            track(Some("1"), None, Some("http://a/1.mp3")),
        ];
        let merged = merge(&[], &payload);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].title.as_deref(), Some("One"));
        assert_eq!(merged[0].audio_url.as_deref(), Some("http://a/1.mp3"));
    }

    #[test]
    fn test_merge_with_empty_inputs() {
        let a = vec![track(Some("1"), None, None)];
        assert_eq!(merge(&a, &[]), a);
        assert_eq!(merge(&[], &a), a);
        assert!(merge(&[], &[]).is_empty());
    }
}

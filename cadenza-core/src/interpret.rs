//! Status interpreter
//!
//! Pure state-transition logic for tracked jobs: given the current job, a
//! freshly polled upstream status, the polled tracks, and the elapsed time,
//! it produces the next job state and an optional save directive.
//!
//! The provider's own terminal signal is not trusted exclusively. It has an
//! observed failure mode where a task reports "first result" indefinitely
//! even though the full output is already available, so two force-complete
//! heuristics fire on local evidence (track count, elapsed time) instead.

use crate::domain::job::{Job, JobStatus};
use crate::domain::track::Track;
use crate::domain::upstream::UpstreamStatus;
use crate::dto::save::{SaveKind, SaveResponse};
use crate::merge::merge;

/// Track count at which a job is considered fully delivered
///
/// Generation tasks normally yield exactly two variants. If the provider's
/// output cardinality ever changes this constant needs revisiting.
pub const EXPECTED_TRACK_COUNT: usize = 2;

/// Minimum elapsed time before the track-count heuristic fires without a
/// FIRST_SUCCESS signal
pub const FALLBACK_FORCE_MS: u64 = 30_000;

/// Hard safety valve: with any output at all, never poll longer than this
pub const HARD_TIMEOUT_MS: u64 = 480_000;

/// Progress ceiling while completion is unconfirmed
const PROGRESS_CEILING: u8 = 95;

/// Progress floor once the first partial result exists
const PROGRESS_FIRST_FLOOR: u8 = 70;

/// Progress floor while a terminal save is being retried
const PROGRESS_SAVE_RETRY_FLOOR: u8 = 96;

/// Outcome of one interpretation cycle
#[derive(Debug, Clone)]
pub struct Evaluation {
    /// The job with its next state applied
    pub job: Job,
    /// Persistence to attempt before the next cycle, if any
    pub save: Option<SaveKind>,
}

/// Advances the job state machine by one polled status
///
/// Terminal jobs pass through untouched. For non-terminal jobs the polled
/// tracks are merged into the job first, then the transition table is
/// applied in order: fatal upstream codes, provider success with output,
/// force-complete heuristics, first-result handling, and finally the
/// "still running" fallback for pending or unrecognized codes.
pub fn evaluate(
    mut job: Job,
    upstream: &UpstreamStatus,
    polled: &[Track],
    elapsed_ms: u64,
) -> Evaluation {
    if job.status.is_terminal() {
        return Evaluation { job, save: None };
    }

    if let UpstreamStatus::Error(code) = upstream {
        job.status = JobStatus::Failed;
        job.last_error = Some(format!("generation failed: {code}"));
        job.progress = 0;
        return Evaluation { job, save: None };
    }

    let merged = merge(&job.latest_tracks, polled);
    let grew = merged.len() > job.latest_tracks.len();
    let count = merged.len();
    job.latest_tracks = merged;

    let first_signal = matches!(upstream, UpstreamStatus::FirstSuccess);
    let success_signal = matches!(upstream, UpstreamStatus::Success);

    // Full delivery: either the provider says so and tracks exist, or local
    // evidence is strong enough to override an ambiguous signal.
    let provider_complete = success_signal && count >= 1;
    let force_full_set = count >= EXPECTED_TRACK_COUNT
        && (first_signal || elapsed_ms > FALLBACK_FORCE_MS);
    let force_overdue = first_signal
        && count >= 1
        && elapsed_ms > 2 * job.estimated_duration_ms;
    let force_hard_timeout = count >= 1 && elapsed_ms > HARD_TIMEOUT_MS;

    if provider_complete || force_full_set || force_overdue || force_hard_timeout {
        job.status = JobStatus::Completed;
        return Evaluation {
            job,
            save: Some(SaveKind::Completed),
        };
    }

    if success_signal {
        // Provider reported success before publishing any payload; hold in
        // place and keep polling until the tracks arrive.
        job.progress = next_progress(&job, elapsed_ms);
        return Evaluation { job, save: None };
    }

    if first_signal && count >= 1 {
        job.status = JobStatus::First;
        job.progress = next_progress(&job, elapsed_ms);
        let save = if grew || !job.first_result_saved {
            Some(SaveKind::Partial)
        } else {
            None
        };
        return Evaluation { job, save };
    }

    // Pending, unknown code, or FIRST without tracks: still running.
    job.progress = next_progress(&job, elapsed_ms);
    Evaluation { job, save: None }
}

/// Folds the result of a save attempt back into the job
///
/// A partial save is accepted only when it actually persisted tracks. A
/// terminal save is accepted whenever the persistence API says success; a
/// rejected or errored terminal save pushes the job back to `First` so the
/// next cycle retries it. Persistence failures are never fatal, because the
/// generation result already exists and must not be dropped.
pub fn apply_save_result(
    mut job: Job,
    kind: SaveKind,
    result: Result<&SaveResponse, &str>,
) -> Job {
    match kind {
        SaveKind::Partial => {
            match result {
                Ok(response) if response.success && response.tracks_count > 0 => {
                    job.first_result_saved = true;
                }
                Ok(_) => {
                    // Accepted-but-empty or rejected: nothing new to persist
                    // yet, retried on the natural poll cadence.
                }
                Err(message) => {
                    job.last_error = Some(format!("partial save failed: {message}"));
                }
            }
            job
        }
        SaveKind::Completed => {
            match result {
                Ok(response) if response.success => {
                    job.status = JobStatus::Completed;
                    job.progress = 100;
                    // The flag records that this save persisted real output;
                    // an idempotent zero-count re-save leaves it as is.
                    if response.tracks_count > 0 {
                        job.final_result_saved = true;
                    }
                }
                other => {
                    job.status = JobStatus::First;
                    job.final_save_retry_count += 1;
                    job.progress = job.progress.max(PROGRESS_SAVE_RETRY_FLOOR);
                    job.last_error = Some(match other {
                        Ok(_) => "final save rejected by persistence API".to_string(),
                        Err(message) => format!("final save failed: {message}"),
                    });
                }
            }
            job
        }
    }
}

/// Returns whether a save response counts as accepted for its kind
///
/// Accepted saves trigger the library-change notification.
pub fn save_accepted(kind: SaveKind, response: &SaveResponse) -> bool {
    match kind {
        SaveKind::Partial => response.success && response.tracks_count > 0,
        SaveKind::Completed => response.success,
    }
}

/// Time-based progress, clamped and floored so it never decreases
///
/// `min(95, 100 * elapsed / estimated)`, floored at the previous value, at
/// 70 once the job holds a first result, and at 96 while a terminal save is
/// being retried.
fn next_progress(job: &Job, elapsed_ms: u64) -> u8 {
    let from_time = if job.estimated_duration_ms == 0 {
        PROGRESS_CEILING
    } else {
        let pct = (elapsed_ms as f64 / job.estimated_duration_ms as f64) * 100.0;
        pct.min(PROGRESS_CEILING as f64) as u8
    };

    let mut progress = from_time.max(job.progress);
    if job.status == JobStatus::First {
        progress = progress.max(PROGRESS_FIRST_FLOOR);
    }
    if job.final_save_retry_count > 0 {
        progress = progress.max(PROGRESS_SAVE_RETRY_FLOOR);
    }
    progress
}

//! Job domain types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::track::Track;

/// One tracked generation request and its lifecycle state
///
/// Structure shared between the supervisor (persists) and the poller (updates).
/// A job is mutated exclusively by its own poller; the store serializes writes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    /// Upstream correlation key, stable for the job's whole life
    pub task_id: String,
    pub status: JobStatus,
    pub title: String,
    pub style: String,
    pub prompt: String,
    /// Percentage in [0, 100], non-decreasing while the job is not failed
    pub progress: u8,
    pub start_time: chrono::DateTime<chrono::Utc>,
    pub estimated_duration_ms: u64,
    /// Consecutive transport failures since the last successful poll
    pub poll_retry_count: u32,
    pub last_error: Option<String>,
    pub first_result_saved: bool,
    pub final_result_saved: bool,
    /// Diagnostic only; terminal-save retries are unbounded
    pub final_save_retry_count: u32,
    pub latest_tracks: Vec<Track>,
}

impl Job {
    /// Creates a new pending job for a freshly submitted generation task
    pub fn new(
        task_id: impl Into<String>,
        title: impl Into<String>,
        style: impl Into<String>,
        prompt: impl Into<String>,
        estimated_duration_ms: u64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            task_id: task_id.into(),
            status: JobStatus::Pending,
            title: title.into(),
            style: style.into(),
            prompt: prompt.into(),
            progress: 0,
            start_time: chrono::Utc::now(),
            estimated_duration_ms,
            poll_retry_count: 0,
            last_error: None,
            first_result_saved: false,
            final_result_saved: false,
            final_save_retry_count: 0,
            latest_tracks: Vec::new(),
        }
    }

    /// Milliseconds elapsed since the job was started, saturating at zero
    pub fn elapsed_ms(&self, now: chrono::DateTime<chrono::Utc>) -> u64 {
        (now - self.start_time).num_milliseconds().max(0) as u64
    }
}

/// Job lifecycle status
///
/// Transitions are forward-only: Pending -> {First, Completed, Failed},
/// First -> {Completed, Failed}. Completed and Failed are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    /// Submitted, no usable output yet
    Pending,
    /// At least one partial track is available
    First,
    Completed,
    Failed,
}

impl JobStatus {
    /// Returns true for states that end polling
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_job_is_pending() {
        let job = Job::new("task-1", "Song", "lofi", "a quiet song", 120_000);
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.progress, 0);
        assert!(job.latest_tracks.is_empty());
        assert!(!job.first_result_saved);
        assert!(!job.final_result_saved);
    }

    #[test]
    fn test_terminal_states() {
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::First.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
    }

    #[test]
    fn test_elapsed_saturates_at_zero() {
        let job = Job::new("task-1", "Song", "lofi", "prompt", 120_000);
        let before = job.start_time - chrono::Duration::seconds(5);
        assert_eq!(job.elapsed_ms(before), 0);
    }
}

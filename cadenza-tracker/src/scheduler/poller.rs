//! Job poller
//!
//! Per-job control loop. Each cycle polls the gateway, runs the status
//! interpreter, performs any requested save, writes the job back to the
//! store, and then either stops (terminal state) or sleeps until the next
//! cycle. Transport failures get bounded linear backoff; the polling
//! cadence widens as the job ages because late jobs do not need the early
//! responsiveness users expect right after submission.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time;
use tracing::{debug, info, warn};

use cadenza_core::domain::job::{Job, JobStatus};
use cadenza_core::domain::track::Track;
use cadenza_core::domain::upstream::UpstreamStatus;
use cadenza_core::interpret::{apply_save_result, evaluate, save_accepted};

use crate::events::LibraryEvent;
use crate::gateway::Gateway;
use crate::store::JobStore;

/// Consecutive transport failures tolerated before the job is failed
pub const MAX_POLL_RETRIES: u32 = 8;

/// Per-retry backoff step
const RETRY_BACKOFF_STEP_MS: u64 = 4_000;

/// Backoff and cadence ceiling
const MAX_DELAY_MS: u64 = 30_000;

/// Control loop for one tracked job
pub struct JobPoller {
    owner: String,
    task_id: String,
    store: Arc<JobStore>,
    gateway: Arc<dyn Gateway>,
    events: broadcast::Sender<LibraryEvent>,
}

impl JobPoller {
    /// Creates a poller for one job
    pub fn new(
        owner: impl Into<String>,
        task_id: impl Into<String>,
        store: Arc<JobStore>,
        gateway: Arc<dyn Gateway>,
        events: broadcast::Sender<LibraryEvent>,
    ) -> Self {
        Self {
            owner: owner.into(),
            task_id: task_id.into(),
            store,
            gateway,
            events,
        }
    }

    /// Runs the loop until the job reaches a terminal state, exhausts its
    /// poll retries, or is removed from the store
    pub async fn run(self) {
        info!("Starting poller for task {}", self.task_id);

        loop {
            let job = match self.store.get(&self.owner, &self.task_id) {
                Ok(Some(job)) => job,
                Ok(None) => {
                    debug!("Task {} removed from store, stopping poller", self.task_id);
                    break;
                }
                Err(e) => {
                    warn!("Store read failed for task {}: {}", self.task_id, e);
                    break;
                }
            };

            if job.status.is_terminal() {
                break;
            }

            let elapsed_ms = job.elapsed_ms(chrono::Utc::now());

            match self.gateway.poll_status(&self.task_id).await {
                Ok(response) => {
                    let terminal = self.handle_poll(job, &response.status, response.tracks, elapsed_ms).await;
                    if terminal {
                        break;
                    }
                    time::sleep(cadence_delay(elapsed_ms)).await;
                }
                Err(e) => {
                    let retries = job.poll_retry_count + 1;
                    let exhausted = retries >= MAX_POLL_RETRIES;
                    self.record_poll_failure(job, retries, exhausted, &e);
                    if exhausted {
                        break;
                    }
                    time::sleep(backoff_delay(retries)).await;
                }
            }
        }

        info!("Poller for task {} finished", self.task_id);
    }

    /// Interprets one successful poll; returns true when the job is terminal
    async fn handle_poll(
        &self,
        mut job: Job,
        status: &str,
        tracks: Vec<Track>,
        elapsed_ms: u64,
    ) -> bool {
        job.poll_retry_count = 0;
        let upstream = UpstreamStatus::parse(status);
        debug!(
            "Task {}: upstream {:?}, {} polled track(s), elapsed {}ms",
            self.task_id,
            upstream,
            tracks.len(),
            elapsed_ms
        );

        let evaluation = evaluate(job, &upstream, &tracks, elapsed_ms);
        let mut job = evaluation.job;

        if let Some(kind) = evaluation.save {
            let result = self
                .gateway
                .save_result(&self.task_id, &job.latest_tracks, kind)
                .await;

            let accepted = matches!(&result, Ok(response) if save_accepted(kind, response));
            job = match &result {
                Ok(response) => apply_save_result(job, kind, Ok(response)),
                Err(e) => apply_save_result(job, kind, Err(&format!("{e:#}"))),
            };

            if accepted {
                info!("Accepted {:?} save for task {}", kind, self.task_id);
                let _ = self.events.send(LibraryEvent {
                    owner: self.owner.clone(),
                    task_id: self.task_id.clone(),
                    kind,
                });
            }
        }

        let terminal = job.status.is_terminal();
        self.commit(job);
        terminal
    }

    /// Records one transport failure, failing the job once retries run out
    fn record_poll_failure(&self, mut job: Job, retries: u32, exhausted: bool, cause: &anyhow::Error) {
        job.poll_retry_count = retries;
        if exhausted {
            warn!(
                "Task {} failed after {} consecutive poll failures: {:#}",
                self.task_id, retries, cause
            );
            job.status = JobStatus::Failed;
            job.progress = 0;
            job.last_error = Some(format!("polling timeout: {cause:#}"));
        } else {
            debug!(
                "Poll failure {}/{} for task {}: {:#}",
                retries, MAX_POLL_RETRIES, self.task_id, cause
            );
            job.last_error = Some(format!("{cause:#}"));
        }
        self.commit(job);
    }

    /// Writes the job back through the store's atomic update
    fn commit(&self, job: Job) {
        let task_id = job.task_id.clone();
        let result = self.store.update(&self.owner, |jobs| {
            if let Some(slot) = jobs.iter_mut().find(|j| j.task_id == task_id) {
                *slot = job;
            }
        });
        if let Err(e) = result {
            warn!("Failed to persist task {}: {}", self.task_id, e);
        }
    }
}

/// Linear backoff after consecutive transport failures, capped at 30s
pub fn backoff_delay(retry_count: u32) -> Duration {
    Duration::from_millis((RETRY_BACKOFF_STEP_MS * u64::from(retry_count)).min(MAX_DELAY_MS))
}

/// Widening poll cadence derived from elapsed time since start
pub fn cadence_delay(elapsed_ms: u64) -> Duration {
    let millis = match elapsed_ms {
        0..60_000 => 6_000,
        60_000..120_000 => 12_000,
        120_000..180_000 => 20_000,
        _ => MAX_DELAY_MS,
    };
    Duration::from_millis(millis)
}

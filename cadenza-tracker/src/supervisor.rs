//! Supervisor
//!
//! Owns the set of currently-polling jobs for every owner. Jobs are
//! submitted here, re-spawned here on cold start, and garbage collected
//! here once terminal and stale. One poller task runs per active job; no
//! poller ever touches the job list directly, all mutation funnels through
//! the store's atomic update.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, info, warn};

use cadenza_core::domain::job::Job;

use crate::config::Config;
use crate::events::LibraryEvent;
use crate::gateway::Gateway;
use crate::scheduler::JobPoller;
use crate::store::{JobStore, StoreError};

/// Supervises all pollers and owns job persistence
pub struct Supervisor {
    store: Arc<JobStore>,
    gateway: Arc<dyn Gateway>,
    config: Config,
    /// Active pollers keyed by "owner:task_id"
    active: Mutex<HashMap<String, JoinHandle<()>>>,
    events: broadcast::Sender<LibraryEvent>,
}

impl Supervisor {
    /// Creates a supervisor over the given store and gateway
    pub fn new(store: Arc<JobStore>, gateway: Arc<dyn Gateway>, config: Config) -> Arc<Self> {
        let (events, _) = broadcast::channel(64);
        Arc::new(Self {
            store,
            gateway,
            config,
            active: Mutex::new(HashMap::new()),
            events,
        })
    }

    /// Subscribes to library-change notifications from accepted saves
    pub fn subscribe(&self) -> broadcast::Receiver<LibraryEvent> {
        self.events.subscribe()
    }

    /// Number of currently active pollers
    pub fn active_count(&self) -> usize {
        self.active.lock().unwrap().len()
    }

    /// Submits a job for tracking
    ///
    /// Re-submission with a known task id updates the record in place
    /// instead of duplicating it. New jobs are prepended; the stored list is
    /// bounded to the most recent `max_stored_jobs` entries. A poller is
    /// spawned unless the job is already terminal or already being polled.
    pub fn submit(self: &Arc<Self>, owner: &str, job: Job) -> Result<(), StoreError> {
        let task_id = job.task_id.clone();
        let max = self.config.max_stored_jobs;

        self.store.update(owner, |jobs| {
            if let Some(existing) = jobs.iter_mut().find(|j| j.task_id == task_id) {
                debug!("Re-submission of task {}, updating in place", task_id);
                existing.title = job.title.clone();
                existing.style = job.style.clone();
                existing.prompt = job.prompt.clone();
                existing.estimated_duration_ms = job.estimated_duration_ms;
            } else {
                jobs.insert(0, job.clone());
                jobs.truncate(max);
            }
        })?;

        if let Some(current) = self.store.get(owner, &task_id)?
            && !current.status.is_terminal()
        {
            self.spawn_poller(owner, &task_id);
        }
        Ok(())
    }

    /// Re-spawns pollers for every non-terminal job of one owner
    ///
    /// Called on cold start so that no job is silently abandoned just
    /// because the process restarted; the pollers pick up from the last
    /// committed store state.
    pub fn resume(self: &Arc<Self>, owner: &str) -> Result<usize, StoreError> {
        let jobs = self.store.load(owner)?;
        let mut spawned = 0;
        for job in &jobs {
            if !job.status.is_terminal() && self.spawn_poller(owner, &job.task_id) {
                spawned += 1;
            }
        }
        if spawned > 0 {
            info!("Resumed {} job(s) for owner {}", spawned, owner);
        }
        Ok(spawned)
    }

    /// Re-spawns pollers for every owner with persisted jobs
    pub fn resume_all(self: &Arc<Self>) -> Result<usize, StoreError> {
        let mut spawned = 0;
        for owner in self.store.owners()? {
            spawned += self.resume(&owner)?;
        }
        Ok(spawned)
    }

    /// Removes terminal jobs older than the retention window
    ///
    /// Non-terminal jobs are never collected regardless of age; abandoning
    /// them is the poller's decision, not the collector's.
    pub fn garbage_collect(&self) -> Result<usize, StoreError> {
        let retention = chrono::Duration::from_std(self.config.retention)
            .unwrap_or_else(|_| chrono::Duration::hours(24));
        let cutoff = chrono::Utc::now() - retention;

        let mut removed = 0;
        for owner in self.store.owners()? {
            self.store.update(&owner, |jobs| {
                let before = jobs.len();
                jobs.retain(|job| !job.status.is_terminal() || job.start_time > cutoff);
                removed += before - jobs.len();
            })?;
        }
        if removed > 0 {
            info!("Garbage collected {} stale job(s)", removed);
        }
        Ok(removed)
    }

    /// Starts the periodic garbage collection task
    pub fn spawn_gc_loop(self: &Arc<Self>) -> JoinHandle<()> {
        let supervisor = Arc::clone(self);
        let interval = self.config.gc_interval;
        tokio::spawn(async move {
            let mut ticker = time::interval(interval);
            ticker.tick().await; // first tick fires immediately, skip it
            loop {
                ticker.tick().await;
                if let Err(e) = supervisor.garbage_collect() {
                    warn!("Garbage collection failed: {}", e);
                }
            }
        })
    }

    /// Stops tracking a job and deletes its record
    ///
    /// Aborting the poller is safe at any point: the last committed store
    /// state is always valid, so a cancelled job never corrupts the list.
    pub fn remove(&self, owner: &str, task_id: &str) -> Result<(), StoreError> {
        let key = poller_key(owner, task_id);
        if let Some(handle) = self.active.lock().unwrap().remove(&key) {
            handle.abort();
        }
        self.store
            .update(owner, |jobs| jobs.retain(|j| j.task_id != task_id))
    }

    /// Spawns a poller task unless one is already active for this job
    fn spawn_poller(self: &Arc<Self>, owner: &str, task_id: &str) -> bool {
        let key = poller_key(owner, task_id);
        let mut active = self.active.lock().unwrap();
        if active.contains_key(&key) {
            return false;
        }

        let poller = JobPoller::new(
            owner,
            task_id,
            Arc::clone(&self.store),
            Arc::clone(&self.gateway),
            self.events.clone(),
        );
        let supervisor = Arc::clone(self);
        let cleanup_key = key.clone();
        let handle = tokio::spawn(async move {
            poller.run().await;
            supervisor.active.lock().unwrap().remove(&cleanup_key);
        });
        active.insert(key, handle);
        true
    }
}

fn poller_key(owner: &str, task_id: &str) -> String {
    format!("{owner}:{task_id}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use cadenza_core::domain::job::JobStatus;
    use cadenza_core::domain::track::Track;
    use cadenza_core::dto::save::{SaveKind, SaveResponse};
    use cadenza_core::dto::status::StatusResponse;

    /// Gateway whose tasks never progress; keeps pollers alive in tests
    struct IdleGateway;

    #[async_trait]
    impl Gateway for IdleGateway {
        async fn poll_status(&self, task_id: &str) -> anyhow::Result<StatusResponse> {
            Ok(StatusResponse {
                task_id: task_id.to_string(),
                status: "PENDING".to_string(),
                tracks: vec![],
            })
        }

        async fn save_result(
            &self,
            _task_id: &str,
            tracks: &[Track],
            _kind: SaveKind,
        ) -> anyhow::Result<SaveResponse> {
            Ok(SaveResponse {
                success: true,
                tracks_count: tracks.len() as u32,
            })
        }
    }

    fn job(task_id: &str, status: JobStatus) -> Job {
        let mut job = Job::new(task_id, "Song", "lofi", "prompt", 120_000);
        job.status = status;
        job
    }

    fn supervisor() -> (Arc<Supervisor>, Arc<JobStore>) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(JobStore::open(dir.keep()).unwrap());
        let sup = Supervisor::new(
            Arc::clone(&store),
            Arc::new(IdleGateway),
            Config::default(),
        );
        (sup, store)
    }

    #[tokio::test]
    async fn test_resume_spawns_only_non_terminal_jobs() {
        let (sup, store) = supervisor();
        store
            .update("alice", |jobs| {
                jobs.push(job("pending-task", JobStatus::Pending));
                jobs.push(job("done-task", JobStatus::Completed));
            })
            .unwrap();

        let spawned = sup.resume_all().unwrap();
        assert_eq!(spawned, 1);
        assert_eq!(sup.active_count(), 1);
    }

    #[tokio::test]
    async fn test_resume_is_idempotent() {
        let (sup, store) = supervisor();
        store
            .update("alice", |jobs| jobs.push(job("t1", JobStatus::First)))
            .unwrap();

        assert_eq!(sup.resume("alice").unwrap(), 1);
        assert_eq!(sup.resume("alice").unwrap(), 0);
        assert_eq!(sup.active_count(), 1);
    }

    #[tokio::test]
    async fn test_submit_deduplicates_by_task_id() {
        let (sup, store) = supervisor();
        sup.submit("alice", job("t1", JobStatus::Pending)).unwrap();

        let mut renamed = job("t1", JobStatus::Pending);
        renamed.title = "New title".to_string();
        sup.submit("alice", renamed).unwrap();

        let jobs = store.load("alice").unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].title, "New title");
        assert_eq!(sup.active_count(), 1);
    }

    #[tokio::test]
    async fn test_submit_bounds_list_to_most_recent() {
        let (sup, store) = supervisor();
        // Terminal jobs so no pollers spawn; only the list bound is under test.
        for i in 0..55 {
            sup.submit("alice", job(&format!("t{i}"), JobStatus::Completed))
                .unwrap();
        }
        let jobs = store.load("alice").unwrap();
        assert_eq!(jobs.len(), 50);
        assert_eq!(jobs[0].task_id, "t54");
        assert_eq!(sup.active_count(), 0);
    }

    #[tokio::test]
    async fn test_remove_aborts_poller_and_deletes_record() {
        let (sup, store) = supervisor();
        sup.submit("alice", job("t1", JobStatus::Pending)).unwrap();
        assert_eq!(sup.active_count(), 1);

        sup.remove("alice", "t1").unwrap();
        assert_eq!(sup.active_count(), 0);
        assert!(store.load("alice").unwrap().is_empty());
    }

    #[test]
    fn test_garbage_collect_retention() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(JobStore::open(dir.keep()).unwrap());

        let mut stale_failed = job("stale-failed", JobStatus::Failed);
        stale_failed.start_time = chrono::Utc::now() - chrono::Duration::hours(25);
        let mut old_pending = job("old-pending", JobStatus::Pending);
        old_pending.start_time = chrono::Utc::now() - chrono::Duration::hours(48);
        let fresh_done = job("fresh-done", JobStatus::Completed);

        store
            .update("alice", |jobs| {
                jobs.push(stale_failed);
                jobs.push(old_pending);
                jobs.push(fresh_done);
            })
            .unwrap();

        let sup = Supervisor::new(Arc::clone(&store), Arc::new(IdleGateway), Config::default());
        let removed = sup.garbage_collect().unwrap();
        assert_eq!(removed, 1);

        let remaining: Vec<_> = store
            .load("alice")
            .unwrap()
            .into_iter()
            .map(|j| j.task_id)
            .collect();
        assert!(remaining.contains(&"old-pending".to_string()));
        assert!(remaining.contains(&"fresh-done".to_string()));
        assert!(!remaining.contains(&"stale-failed".to_string()));
    }
}

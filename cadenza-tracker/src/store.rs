//! Job store
//!
//! Durable, per-owner job lists: one JSON array per owner under the data
//! directory, mirrored in process memory. Every mutation goes through
//! [`JobStore::update`], which locks the mirror, applies a transform, and
//! persists before unlocking. Pollers running concurrently on different
//! jobs therefore never lose each other's writes, and the file on disk is
//! always the last committed state, ready for resume after a restart.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use thiserror::Error;
use tracing::{debug, warn};

use cadenza_core::domain::job::Job;

/// Errors from the job store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Owner ids become file names; path-like ids are refused
    #[error("invalid owner id: {0}")]
    InvalidOwner(String),
}

/// Durable per-owner collection of job records
pub struct JobStore {
    dir: PathBuf,
    cache: Mutex<HashMap<String, Vec<Job>>>,
}

impl JobStore {
    /// Opens (and creates if needed) the store at the given directory
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            cache: Mutex::new(HashMap::new()),
        })
    }

    /// Returns the owner's job list, loading it from disk on first access
    ///
    /// A missing or unreadable file yields an empty list; a corrupt list is
    /// logged and discarded rather than blocking the tracker.
    pub fn load(&self, owner: &str) -> Result<Vec<Job>, StoreError> {
        validate_owner(owner)?;
        let mut cache = self.cache.lock().unwrap();
        Ok(self.loaded(&mut cache, owner).clone())
    }

    /// Returns a single job by task id, if present
    pub fn get(&self, owner: &str, task_id: &str) -> Result<Option<Job>, StoreError> {
        validate_owner(owner)?;
        let mut cache = self.cache.lock().unwrap();
        Ok(self
            .loaded(&mut cache, owner)
            .iter()
            .find(|j| j.task_id == task_id)
            .cloned())
    }

    /// Atomically transforms the owner's job list and persists it
    ///
    /// The mirror is read, transformed, written back, and flushed to disk
    /// under a single lock, so interleaved asynchronous callers cannot
    /// overwrite each other's updates.
    pub fn update<F>(&self, owner: &str, transform: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Vec<Job>),
    {
        validate_owner(owner)?;
        let mut cache = self.cache.lock().unwrap();
        let jobs = self.loaded(&mut cache, owner);
        transform(&mut *jobs);
        let serialized = serde_json::to_vec_pretty(&*jobs)?;

        // Write-then-rename so a crash mid-write never corrupts the list.
        let path = self.owner_path(owner);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serialized)?;
        fs::rename(&tmp, &path)?;
        debug!("Persisted {} job(s) for owner {}", jobs.len(), owner);
        Ok(())
    }

    /// Lists every owner with a persisted job list
    pub fn owners(&self) -> Result<Vec<String>, StoreError> {
        let mut owners = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if let Some(owner) = name.strip_suffix(".json") {
                owners.push(owner.to_string());
            }
        }
        owners.sort();
        Ok(owners)
    }

    fn owner_path(&self, owner: &str) -> PathBuf {
        self.dir.join(format!("{owner}.json"))
    }

    fn loaded<'a>(
        &self,
        cache: &'a mut HashMap<String, Vec<Job>>,
        owner: &str,
    ) -> &'a mut Vec<Job> {
        cache.entry(owner.to_string()).or_insert_with(|| {
            let path = self.owner_path(owner);
            match fs::read(&path) {
                Ok(bytes) => match serde_json::from_slice(&bytes) {
                    Ok(jobs) => jobs,
                    Err(e) => {
                        warn!("Discarding corrupt job list for owner {}: {}", owner, e);
                        Vec::new()
                    }
                },
                Err(_) => Vec::new(),
            }
        })
    }
}

fn validate_owner(owner: &str) -> Result<(), StoreError> {
    if owner.is_empty()
        || owner.contains('/')
        || owner.contains('\\')
        || owner.contains("..")
    {
        return Err(StoreError::InvalidOwner(owner.to_string()));
    }
    Ok(())
}

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::error::RequestError;
use crate::registry::ConnectionId;

/// Cancellation flag handed to a running job.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }
}

struct JobEntry {
    owner: ConnectionId,
    flag: CancellationFlag,
}

/// Job id → (owning connection, cancellation flag).
///
/// Nothing registers jobs yet; the registry exists so that connection
/// teardown and server shutdown already cancel whatever a connection owns.
#[derive(Default)]
pub struct JobRegistry {
    jobs: Mutex<HashMap<String, JobEntry>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a job owned by `owner`. Re-registering an id cancels the job
    /// previously registered under it.
    pub fn register(&self, job_id: impl Into<String>, owner: ConnectionId) -> CancellationFlag {
        let flag = CancellationFlag::default();
        let previous = self.lock().insert(
            job_id.into(),
            JobEntry {
                owner,
                flag: flag.clone(),
            },
        );
        if let Some(previous) = previous {
            previous.flag.cancel();
        }
        flag
    }

    /// Cancel one job by id.
    pub fn cancel(&self, job_id: &str) -> Result<(), RequestError> {
        let entry = self
            .lock()
            .remove(job_id)
            .ok_or_else(|| RequestError::job_not_found(job_id))?;
        entry.flag.cancel();
        debug!(job_id, owner = %entry.owner, "job cancelled");
        Ok(())
    }

    /// Stop tracking a job that ran to completion. Its flag is left as is.
    pub fn finish(&self, job_id: &str) -> bool {
        self.lock().remove(job_id).is_some()
    }

    /// Cancel and forget every job owned by a connection.
    pub fn cancel_owned_by(&self, owner: ConnectionId) -> usize {
        let mut jobs = self.lock();
        let before = jobs.len();
        jobs.retain(|_, entry| {
            if entry.owner == owner {
                entry.flag.cancel();
                false
            } else {
                true
            }
        });
        before - jobs.len()
    }

    /// Cancel and forget every job.
    pub fn cancel_all(&self) -> usize {
        let drained: Vec<JobEntry> = self.lock().drain().map(|(_, entry)| entry).collect();
        for entry in &drained {
            entry.flag.cancel();
        }
        drained.len()
    }

    /// `None` if the job is not tracked.
    pub fn is_cancelled(&self, job_id: &str) -> Option<bool> {
        self.lock().get(job_id).map(|entry| entry.flag.is_cancelled())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, JobEntry>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

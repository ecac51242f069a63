use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::task::AbortHandle;

use crate::domain::JobId;

/// Abort handles of jobs currently executing, shared by the worker (which
/// registers them) and the job service (which cancels them).
#[derive(Clone, Default)]
pub struct RunningJobs {
    inner: Arc<Mutex<HashMap<JobId, AbortHandle>>>,
}

impl RunningJobs {
    pub fn register(&self, job_id: JobId, handle: AbortHandle) {
        self.lock().insert(job_id, handle);
    }

    pub fn remove(&self, job_id: JobId) {
        self.lock().remove(&job_id);
    }

    pub fn is_running(&self, job_id: JobId) -> bool {
        self.lock().contains_key(&job_id)
    }

    /// Aborting drops the job's future, which releases its working directory
    /// and staged upload through their drop guards.
    pub fn abort(&self, job_id: JobId) -> bool {
        match self.lock().remove(&job_id) {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn abort_all(&self) -> usize {
        let handles: Vec<AbortHandle> = self.lock().drain().map(|(_, h)| h).collect();
        for handle in &handles {
            handle.abort();
        }
        handles.len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<JobId, AbortHandle>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

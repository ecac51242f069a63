use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::application::ports::{JobRepository, RepositoryError};
use crate::domain::{Job, JobId};

/// Process-local job store; records live as long as the server.
#[derive(Default)]
pub struct InMemoryJobRepository {
    jobs: RwLock<HashMap<JobId, Job>>,
}

impl InMemoryJobRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobRepository for InMemoryJobRepository {
    async fn create(&self, job: &Job) -> Result<(), RepositoryError> {
        let mut jobs = self.jobs.write().await;
        if jobs.contains_key(&job.id) {
            return Err(RepositoryError::AlreadyExists(job.id));
        }
        jobs.insert(job.id, job.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: JobId) -> Result<Option<Job>, RepositoryError> {
        Ok(self.jobs.read().await.get(&id).cloned())
    }

    async fn update(&self, job: &Job) -> Result<(), RepositoryError> {
        let mut jobs = self.jobs.write().await;
        let stored = jobs
            .get_mut(&job.id)
            .ok_or(RepositoryError::NotFound(job.id))?;

        if stored.status.is_terminal() {
            return Err(RepositoryError::TerminalState {
                job_id: job.id,
                status: stored.status,
            });
        }

        *stored = job.clone();
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Job>, RepositoryError> {
        let mut jobs: Vec<Job> = self.jobs.read().await.values().cloned().collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(jobs)
    }

    async fn delete(&self, id: JobId) -> Result<bool, RepositoryError> {
        Ok(self.jobs.write().await.remove(&id).is_some())
    }

    async fn delete_all(&self) -> Result<usize, RepositoryError> {
        let mut jobs = self.jobs.write().await;
        let count = jobs.len();
        jobs.clear();
        Ok(count)
    }
}

use crate::domain::{JobId, JobStatus};

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("job not found: {0}")]
    NotFound(JobId),
    #[error("job already exists: {0}")]
    AlreadyExists(JobId),
    #[error("job {job_id} is {status} and can no longer be modified")]
    TerminalState { job_id: JobId, status: JobStatus },
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

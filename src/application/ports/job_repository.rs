use async_trait::async_trait;

use crate::domain::{Job, JobId};

use super::RepositoryError;

#[async_trait]
pub trait JobRepository: Send + Sync {
    async fn create(&self, job: &Job) -> Result<(), RepositoryError>;

    async fn get_by_id(&self, id: JobId) -> Result<Option<Job>, RepositoryError>;

    /// Replaces the stored record. Records in a terminal status are never overwritten.
    async fn update(&self, job: &Job) -> Result<(), RepositoryError>;

    /// Newest first.
    async fn list(&self) -> Result<Vec<Job>, RepositoryError>;

    async fn delete(&self, id: JobId) -> Result<bool, RepositoryError>;

    async fn delete_all(&self) -> Result<usize, RepositoryError>;
}

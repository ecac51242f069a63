use serde::Serialize;

use crate::domain::{Job, JobStatus, TranscriptAnalysis};

#[derive(Serialize)]
pub struct JobResponse {
    pub job_id: String,
    pub status: String,
    pub filename: String,
    pub language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<JobResult>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Serialize)]
pub struct JobResult {
    pub transcript: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<TranscriptAnalysis>,
}

impl JobResponse {
    /// Full view; the transcript is included only once the job has completed.
    pub fn detailed(job: Job) -> Self {
        let result = match (job.status, job.transcript_text) {
            (JobStatus::Completed, Some(transcript)) => Some(JobResult {
                transcript,
                analysis: job.analysis,
            }),
            _ => None,
        };

        Self {
            job_id: job.id.to_string(),
            status: job.status.as_str().to_string(),
            filename: job.source_filename,
            language: job.language,
            error: job.error,
            result,
            created_at: job.created_at.to_rfc3339(),
            updated_at: job.updated_at.to_rfc3339(),
        }
    }

    pub fn summary(job: Job) -> Self {
        Self {
            job_id: job.id.to_string(),
            status: job.status.as_str().to_string(),
            filename: job.source_filename,
            language: job.language,
            error: job.error,
            result: None,
            created_at: job.created_at.to_rfc3339(),
            updated_at: job.updated_at.to_rfc3339(),
        }
    }
}

use chrono::{DateTime, Utc};

use super::{JobId, JobStatus, TranscriptAnalysis};

#[derive(Debug, Clone)]
pub struct Job {
    pub id: JobId,
    pub status: JobStatus,
    pub source_filename: String,
    pub language: String,
    pub model_hint: String,
    pub custom_prompt: Option<String>,
    pub transcript_text: Option<String>,
    pub analysis: Option<TranscriptAnalysis>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn new(
        source_filename: String,
        language: String,
        model_hint: String,
        custom_prompt: Option<String>,
    ) -> Self {
        Self::with_id(JobId::new(), source_filename, language, model_hint, custom_prompt)
    }

    /// A queued job under an id reserved earlier, e.g. while its upload was staged.
    pub fn with_id(
        id: JobId,
        source_filename: String,
        language: String,
        model_hint: String,
        custom_prompt: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            status: JobStatus::Queued,
            source_filename,
            language,
            model_hint,
            custom_prompt,
            transcript_text: None,
            analysis: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn start_processing(&mut self) -> Result<(), JobTransitionError> {
        self.transition(JobStatus::Processing)
    }

    pub fn complete(
        &mut self,
        transcript_text: String,
        analysis: Option<TranscriptAnalysis>,
    ) -> Result<(), JobTransitionError> {
        self.transition(JobStatus::Completed)?;
        self.transcript_text = Some(transcript_text);
        self.analysis = analysis;
        Ok(())
    }

    pub fn fail(&mut self, error: impl Into<String>) -> Result<(), JobTransitionError> {
        self.transition(JobStatus::Failed)?;
        self.error = Some(error.into());
        Ok(())
    }

    fn transition(&mut self, next: JobStatus) -> Result<(), JobTransitionError> {
        if !self.status.can_transition_to(next) {
            return Err(JobTransitionError {
                job_id: self.id,
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("job {job_id}: illegal status transition {from} -> {to}")]
pub struct JobTransitionError {
    pub job_id: JobId,
    pub from: JobStatus,
    pub to: JobStatus,
}

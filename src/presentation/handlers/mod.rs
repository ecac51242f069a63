mod error;
mod health;
mod job_response;
mod job_status;
mod transcribe;

pub use error::{ApiError, ErrorResponse};
pub use health::health_handler;
pub use job_response::{JobResponse, JobResult};
pub use job_status::{
    delete_all_jobs_handler, delete_job_handler, job_status_handler, list_jobs_handler,
};
pub use transcribe::transcribe_handler;

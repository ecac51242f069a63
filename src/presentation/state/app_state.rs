use std::sync::Arc;

use crate::application::services::JobService;
use crate::presentation::config::Settings;

#[derive(Clone)]
pub struct AppState {
    pub job_service: Arc<JobService>,
    pub settings: Settings,
}

/// Job trigger flow: upload a YAML job configuration and start a job.
use crate::api::ApiClient;
use crate::api::types::UploadFile;

use super::FlowError;

/// Shown when the backend accepts the job without a message of its own.
pub const TRIGGER_SUCCESS_FALLBACK: &str = "ELT Job triggered successfully!";

#[derive(Debug, Clone)]
pub struct JobTrigger {
    api: ApiClient,
}

impl JobTrigger {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Post `file` to `/trigger-job` and return the message to show.
    ///
    /// `None` fails locally without a request. The request carries the
    /// bearer token only through the interceptor.
    pub fn trigger(&self, file: Option<&UploadFile>) -> Result<String, FlowError> {
        let file = file.ok_or(FlowError::NoFileSelected)?;

        match self.api.trigger_job(file) {
            Ok(response) => Ok(response
                .message
                .filter(|message| !message.is_empty())
                .unwrap_or_else(|| TRIGGER_SUCCESS_FALLBACK.to_string())),
            Err(err) => Err(FlowError::backend(
                format!("Failed to trigger ELT job: {}", err.detail_or_message()),
                err,
            )),
        }
    }
}

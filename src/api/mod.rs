/// Blocking HTTP client for the ELT backend.
///
/// One [`ApiClient`] wraps a shared `ureq::Agent` with two middlewares:
///
/// - [`ActivityRecorder`](crate::activity::ActivityRecorder) (optional):
///   appends one JSONL line per request when activity logging is enabled.
/// - [`BearerAuth`](interceptor::BearerAuth): attaches the session token.
///
/// Every endpoint method returns [`ApiError`] on failure so that each flow
/// can build its own operator-facing message from the backend's `error`
/// detail or the transport message. Nothing is retried. No overall request
/// timeout is applied unless `backend.timeout_ms` is set.
pub mod interceptor;
pub mod multipart;
pub mod types;

use std::time::Duration;

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::activity::{ActivityLog, ActivityRecorder};
use crate::config::ConsoleConfig;
use crate::session::SessionStore;

use interceptor::BearerAuth;
use multipart::MultipartBody;
use types::{
    ConfigDetail, ConfigHistoryResponse, ConfigId, ConfigSummary, CoverageReport, Credentials,
    DataPreview, ErrorBody, HealthStatus, LogCollection, LogsResponse, LoginResponse,
    TriggerResponse, UploadFile,
};

/// Form field name the backend reads uploads from.
const UPLOAD_FIELD: &str = "file";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ApiError {
    /// The backend answered with a non-success status.
    #[error("backend returned HTTP {status}")]
    Status { status: u16, detail: Option<String> },
    /// The request never produced a response (connection refused, DNS, ...).
    #[error("{0}")]
    Transport(String),
    /// The response body did not have the expected shape.
    #[error("failed to decode backend response: {0}")]
    Decode(String),
}

impl ApiError {
    /// The `error` field the backend put in its response body, if any.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Status { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Backend detail when present, otherwise the transport-level message.
    pub fn detail_or_message(&self) -> String {
        self.detail()
            .map(str::to_string)
            .unwrap_or_else(|| self.to_string())
    }
}

impl From<ureq::Error> for ApiError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(status, response) => {
                let detail = response
                    .into_string()
                    .ok()
                    .and_then(|body| error_detail(&body));
                Self::Status { status, detail }
            }
            ureq::Error::Transport(transport) => Self::Transport(transport.to_string()),
        }
    }
}

/// Extract a non-empty `error` string from a backend error body.
fn error_detail(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()?
        .error
        .filter(|detail| !detail.trim().is_empty())
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Cheap-to-clone handle; clones share the underlying agent.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    agent: ureq::Agent,
}

impl ApiClient {
    /// Client with no request timeout and no activity log.
    pub fn new(base_url: &str, session: SessionStore) -> Self {
        Self::build(base_url, None, None, session)
    }

    /// Client configured from the resolved console configuration.
    pub fn from_config(config: &ConsoleConfig, session: SessionStore) -> Self {
        let timeout = match config.backend.timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        };
        let activity = if config.logging.enabled {
            config.activity_log_path().map(ActivityLog::new)
        } else {
            None
        };
        Self::build(&config.backend.base_url, timeout, activity, session)
    }

    fn build(
        base_url: &str,
        timeout: Option<Duration>,
        activity: Option<ActivityLog>,
        session: SessionStore,
    ) -> Self {
        let mut builder = ureq::AgentBuilder::new();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(log) = activity {
            builder = builder.middleware(ActivityRecorder::new(log));
        }
        let agent = builder.middleware(BearerAuth::new(session)).build();

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            agent,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `POST /auth/login`.
    pub fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError> {
        let response = self.agent.post(&self.url("/auth/login")).send_json(credentials)?;
        decode(response)
    }

    /// `POST /trigger-job` with the file as multipart form data.
    pub fn trigger_job(&self, file: &UploadFile) -> Result<TriggerResponse, ApiError> {
        self.post_file("/trigger-job", file)
    }

    /// `POST /data-view` with the file as multipart form data.
    pub fn data_view(&self, file: &UploadFile) -> Result<DataPreview, ApiError> {
        self.post_file("/data-view", file)
    }

    /// `GET /logs`.
    pub fn logs(&self) -> Result<LogCollection, ApiError> {
        let response: LogsResponse = self.get_json("/logs")?;
        Ok(LogCollection::from(response.logs))
    }

    /// `GET /config-history`.
    pub fn config_history(&self) -> Result<Vec<ConfigSummary>, ApiError> {
        let response: ConfigHistoryResponse = self.get_json("/config-history")?;
        Ok(response.configs)
    }

    /// `GET /config/{id}`.
    pub fn config_detail(&self, id: &ConfigId) -> Result<ConfigDetail, ApiError> {
        self.get_json(&format!("/config/{id}"))
    }

    /// `GET /coverage-report`.
    pub fn coverage_report(&self) -> Result<CoverageReport, ApiError> {
        self.get_json("/coverage-report")
    }

    /// `GET /`: backend liveness.
    pub fn health(&self) -> Result<HealthStatus, ApiError> {
        self.get_json("/")
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.agent.get(&self.url(path)).call()?;
        decode(response)
    }

    fn post_file<T: DeserializeOwned>(&self, path: &str, file: &UploadFile) -> Result<T, ApiError> {
        let body = MultipartBody::single_file(UPLOAD_FIELD, file);
        let response = self
            .agent
            .post(&self.url(path))
            .set("Content-Type", &body.content_type())
            .send_bytes(body.as_bytes())?;
        decode(response)
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

fn decode<T: DeserializeOwned>(response: ureq::Response) -> Result<T, ApiError> {
    response
        .into_json()
        .map_err(|err| ApiError::Decode(err.to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::storage::MemoryStorage;

    fn session() -> SessionStore {
        SessionStore::new(Arc::new(MemoryStorage::new()))
    }

    #[test]
    fn error_detail_reads_backend_error_field() {
        assert_eq!(
            error_detail(r#"{"error": "Invalid YAML"}"#).as_deref(),
            Some("Invalid YAML")
        );
        assert!(error_detail(r#"{"error": "  "}"#).is_none());
        assert!(error_detail(r#"{"message": "x"}"#).is_none());
        assert!(error_detail("<html>").is_none());
    }

    #[test]
    fn detail_or_message_falls_back_to_display() {
        let with_detail = ApiError::Status {
            status: 400,
            detail: Some("No file uploaded".into()),
        };
        assert_eq!(with_detail.detail_or_message(), "No file uploaded");
        assert_eq!(with_detail.status(), Some(400));

        let bare = ApiError::Status {
            status: 502,
            detail: None,
        };
        assert_eq!(bare.detail_or_message(), "backend returned HTTP 502");

        let transport = ApiError::Transport("connection refused".into());
        assert_eq!(transport.detail_or_message(), "connection refused");
        assert!(transport.status().is_none());
    }

    #[test]
    fn client_strips_trailing_slash() {
        let client = ApiClient::new("http://localhost:5000/", session());
        assert_eq!(client.base_url(), "http://localhost:5000");
        assert_eq!(client.url("/logs"), "http://localhost:5000/logs");
    }

    #[test]
    fn client_from_default_config() {
        let config = ConsoleConfig::default();
        let client = ApiClient::from_config(&config, session());
        assert_eq!(client.base_url(), "http://localhost:5000");
    }
}

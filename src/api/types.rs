/// Request and response types exchanged with the ELT backend.
use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

/// Body of `POST /auth/login`.
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Successful login response. Both fields are required.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub role: String,
}

// ---------------------------------------------------------------------------
// Uploads
// ---------------------------------------------------------------------------

/// A file selected for upload.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk. The upload keeps only the final path component
    /// as its name.
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes =
            fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "config.yaml".to_string());
        Ok(Self { file_name, bytes })
    }

    /// MIME type sent with the multipart part.
    pub fn content_type(&self) -> &'static str {
        let lower = self.file_name.to_ascii_lowercase();
        if lower.ends_with(".yaml") || lower.ends_with(".yml") {
            "application/x-yaml"
        } else {
            "application/octet-stream"
        }
    }
}

impl fmt::Debug for UploadFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadFile")
            .field("file_name", &self.file_name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Response of `POST /trigger-job`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TriggerResponse {
    #[serde(default)]
    pub message: Option<String>,
}

// ---------------------------------------------------------------------------
// Logs
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct LogsResponse {
    #[serde(default)]
    pub logs: Vec<String>,
}

/// The backend's current log tail. Replaced wholesale on every fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogCollection {
    pub lines: Vec<String>,
}

impl LogCollection {
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Lines with the trailing newline the backend keeps from the log file
    /// stripped.
    pub fn display_lines(&self) -> impl Iterator<Item = &str> {
        self.lines
            .iter()
            .map(|line| line.trim_end_matches(['\r', '\n']))
    }
}

impl From<Vec<String>> for LogCollection {
    fn from(lines: Vec<String>) -> Self {
        Self { lines }
    }
}

// ---------------------------------------------------------------------------
// Config history
// ---------------------------------------------------------------------------

/// Identifier of a stored configuration. The backend uses integers, but
/// string ids are accepted as well.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigId {
    Number(i64),
    Text(String),
}

impl ConfigId {
    /// Parse an id typed by the operator.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.parse::<i64>() {
            Ok(n) => Self::Number(n),
            Err(_) => Self::Text(raw.to_string()),
        }
    }
}

impl fmt::Display for ConfigId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ConfigHistoryResponse {
    #[serde(default)]
    pub configs: Vec<ConfigSummary>,
}

/// One row of `GET /config-history`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigSummary {
    pub id: ConfigId,
    #[serde(default)]
    pub version: Option<i64>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub yaml_preview: Option<String>,
    /// Any other metadata the backend sends along.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Full document returned by `GET /config/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigDetail(pub Value);

impl ConfigDetail {
    /// The raw YAML body, when the backend wraps it in a `yaml_content` field.
    pub fn yaml_content(&self) -> Option<&str> {
        self.0.get("yaml_content").and_then(Value::as_str)
    }

    /// Text suitable for display: the YAML body if present, otherwise the
    /// whole document as pretty JSON.
    pub fn display_text(&self) -> String {
        match self.yaml_content() {
            Some(yaml) => yaml.to_string(),
            None => serde_json::to_string_pretty(&self.0).unwrap_or_else(|_| self.0.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Data view
// ---------------------------------------------------------------------------

/// A single preview row: column name to cell value.
pub type Row = serde_json::Map<String, Value>;

/// Tabular preview returned by `POST /data-view`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataPreview {
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Row>,
}

// ---------------------------------------------------------------------------
// Dashboard extras
// ---------------------------------------------------------------------------

/// Response of `GET /coverage-report`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CoverageReport {
    #[serde(default)]
    pub totals: CoverageTotals,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CoverageTotals {
    #[serde(default)]
    pub percent_covered_display: Option<Value>,
}

impl CoverageReport {
    /// Coverage percentage as the backend formats it.
    pub fn percent_display(&self) -> Option<String> {
        match self.totals.percent_covered_display.as_ref()? {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

/// Response of `GET /`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HealthStatus {
    #[serde(default)]
    pub status: String,
}

/// Error body the backend attaches to failed requests.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

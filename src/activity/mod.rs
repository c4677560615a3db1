/// Opt-in request activity log.
///
/// When `logging.enabled` is set, every backend request made by the console
/// is appended to `~/.elt-console/activity.jsonl` (one JSON object per line)
/// by the [`ActivityRecorder`] middleware. `elt-console activity` reads the
/// file back. Headers and bodies are never recorded, so tokens and passwords
/// stay out of the log.
///
/// All file I/O is best-effort: a failed append never fails the request.
use std::fs::{self, OpenOptions, create_dir_all};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use ureq::{Middleware, MiddlewareNext, Request, Response};

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

/// A single line of the activity log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub timestamp: String,
    pub method: String,
    /// Request path without scheme, host or query string.
    pub path: String,
    /// HTTP status, absent when no response arrived.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    pub success: bool,
    pub latency_ms: u64,
    /// Transport error message, only set when no response arrived.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ---------------------------------------------------------------------------
// Log file
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ActivityLog {
    path: PathBuf,
}

impl ActivityLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default location: `~/.elt-console/activity.jsonl`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".elt-console").join("activity.jsonl"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, entry: &ActivityEntry) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let json = serde_json::to_string(entry)?;
        writeln!(file, "{json}")?;

        Ok(())
    }

    /// Read every entry, skipping malformed lines. Missing file → empty.
    pub fn read_all(&self) -> Vec<ActivityEntry> {
        let Ok(file) = fs::File::open(&self.path) else {
            return Vec::new();
        };

        BufReader::new(file)
            .lines()
            .map_while(Result::ok)
            .filter_map(|line| serde_json::from_str::<ActivityEntry>(&line).ok())
            .collect()
    }

    /// The last `limit` entries, oldest first.
    pub fn read_recent(&self, limit: usize) -> Vec<ActivityEntry> {
        let mut entries = self.read_all();
        let skip = entries.len().saturating_sub(limit);
        entries.drain(..skip);
        entries
    }
}

// ---------------------------------------------------------------------------
// Middleware
// ---------------------------------------------------------------------------

/// `ureq` middleware that times each request and appends an entry.
pub struct ActivityRecorder {
    log: ActivityLog,
}

impl ActivityRecorder {
    pub fn new(log: ActivityLog) -> Self {
        Self { log }
    }
}

impl Middleware for ActivityRecorder {
    fn handle(&self, request: Request, next: MiddlewareNext) -> Result<Response, ureq::Error> {
        let method = request.method().to_string();
        let path = request_path(request.url()).to_string();
        let started = Instant::now();

        let result = next.handle(request);

        let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let (status, success, error) = match &result {
            Ok(response) => (Some(response.status()), true, None),
            Err(ureq::Error::Status(code, _)) => (Some(*code), false, None),
            Err(ureq::Error::Transport(transport)) => (None, false, Some(transport.to_string())),
        };

        let entry = ActivityEntry {
            timestamp: Utc::now().to_rfc3339(),
            method,
            path,
            status,
            success,
            latency_ms,
            error,
        };
        let _ = self.log.append(&entry);

        result
    }
}

/// Strip scheme, authority and query from a request URL.
fn request_path(url: &str) -> &str {
    let without_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    let path = without_scheme
        .find('/')
        .map_or("/", |idx| &without_scheme[idx..]);
    path.split(['?', '#']).next().unwrap_or(path)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(path: &str, status: Option<u16>) -> ActivityEntry {
        ActivityEntry {
            timestamp: Utc::now().to_rfc3339(),
            method: "GET".to_string(),
            path: path.to_string(),
            status,
            success: status.is_some_and(|s| s < 400),
            latency_ms: 12,
            error: None,
        }
    }

    #[test]
    fn request_path_strips_host_and_query() {
        assert_eq!(request_path("http://localhost:5000/logs"), "/logs");
        assert_eq!(request_path("http://localhost:5000/config/3?x=1"), "/config/3");
        assert_eq!(request_path("http://localhost:5000"), "/");
        assert_eq!(request_path("/already/a/path"), "/already/a/path");
    }

    #[test]
    fn append_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let log = ActivityLog::new(dir.path().join("logs").join("activity.jsonl"));

        log.append(&entry("/logs", Some(200))).unwrap();
        log.append(&entry("/config-history", Some(401))).unwrap();

        let entries = log.read_all();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].path, "/logs");
        assert!(entries[0].success);
        assert_eq!(entries[1].status, Some(401));
        assert!(!entries[1].success);
    }

    #[test]
    fn read_recent_keeps_the_tail() {
        let dir = tempfile::tempdir().unwrap();
        let log = ActivityLog::new(dir.path().join("activity.jsonl"));
        for i in 0..5 {
            log.append(&entry(&format!("/config/{i}"), Some(200))).unwrap();
        }

        let recent = log.read_recent(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].path, "/config/3");
        assert_eq!(recent[1].path, "/config/4");
        assert_eq!(log.read_recent(50).len(), 5);
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("activity.jsonl");
        let log = ActivityLog::new(&path);
        log.append(&entry("/logs", Some(200))).unwrap();
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "not json").unwrap();

        assert_eq!(log.read_all().len(), 1);
    }

    #[test]
    fn missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let log = ActivityLog::new(dir.path().join("none.jsonl"));
        assert!(log.read_all().is_empty());
    }

    #[test]
    fn transport_entries_omit_status() {
        let mut e = entry("/logs", None);
        e.error = Some("connection refused".to_string());
        let json = serde_json::to_string(&e).unwrap();
        assert!(!json.contains("\"status\""));
        assert!(json.contains("connection refused"));
    }
}

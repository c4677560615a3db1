/// Configuration schema and defaults for elt-console.
///
/// Defines the TOML-serializable configuration structure with the sections
/// `[backend]`, `[logs]`, `[storage]` and `[logging]`.
///
/// Every field has a built-in default. Users only need to set the values they
/// want to override.
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level console configuration.
///
/// Maps directly to `~/.elt-console/config.toml` and `.elt-console.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub backend: BackendConfig,
    pub logs: LogsConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

impl ConsoleConfig {
    /// Resolved path of the session/preview storage file.
    pub fn storage_path(&self) -> Option<PathBuf> {
        expand_home(&self.storage.path)
    }

    /// Resolved path of the activity log.
    pub fn activity_log_path(&self) -> Option<PathBuf> {
        expand_home(&self.logging.path)
    }

    /// Annotated default config written by `elt-console config init`.
    pub fn default_toml() -> String {
        r#"# elt-console configuration
#
# Configuration hierarchy (highest precedence wins):
#   1. Environment variables (ELT_CONSOLE_*)
#   2. Project config (.elt-console.toml in current directory)
#   3. User global config (~/.elt-console/config.toml)
#   4. Built-in defaults

[backend]
base_url = "http://localhost:5000"
timeout_ms = 0                        # 0 = no client-side timeout

[logs]
poll_interval_secs = 10               # Log viewer refresh interval

[storage]
path = "~/.elt-console/storage.json"  # Session token, role and last data preview

[logging]
enabled = false                       # Record every backend request (no headers, no bodies)
path = "~/.elt-console/activity.jsonl"
"#
        .to_string()
    }
}

// ---------------------------------------------------------------------------
// [backend]
// ---------------------------------------------------------------------------

/// Where the ELT backend lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL, without trailing slash.
    pub base_url: String,
    /// Overall request timeout in milliseconds. `0` disables the timeout.
    pub timeout_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            timeout_ms: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// [logs]
// ---------------------------------------------------------------------------

/// Log viewer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogsConfig {
    /// Seconds between two log polls.
    pub poll_interval_secs: u64,
}

impl LogsConfig {
    /// Poll interval, never shorter than one second.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 10,
        }
    }
}

// ---------------------------------------------------------------------------
// [storage]
// ---------------------------------------------------------------------------

/// Client-side persistent storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the storage file. `~` is expanded to the home directory.
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: "~/.elt-console/storage.json".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

/// Activity logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Whether backend requests are recorded.
    pub enabled: bool,
    /// Path to the activity log file. `~` is expanded to the home directory.
    pub path: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: "~/.elt-console/activity.jsonl".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Expand a leading `~` to the home directory. Empty paths resolve to `None`.
pub fn expand_home(raw: &str) -> Option<PathBuf> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if raw == "~" {
        return dirs::home_dir();
    }
    match raw.strip_prefix("~/").or_else(|| raw.strip_prefix("~\\")) {
        Some(rest) => dirs::home_dir().map(|home| home.join(rest)),
        None => Some(PathBuf::from(raw)),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

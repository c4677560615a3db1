//! CLI command implementations for elt-console.
//!
//! Provides subcommand handlers for:
//! - `elt-console login|logout|status`: session management
//! - `elt-console trigger FILE`: start an ELT job from a YAML config
//! - `elt-console logs`: follow the backend job log
//! - `elt-console history [--id ID]`: configuration history
//! - `elt-console preview FILE` / `view`: tabular data preview and filter
//! - `elt-console coverage|health`: dashboard extras
//! - `elt-console activity`: recorded backend requests
//! - `elt-console config show|init|set|reset`: configuration management

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc;

use anyhow::{Context, Result};
use colored::Colorize;

use crate::activity::{ActivityEntry, ActivityLog};
use crate::api::ApiClient;
use crate::api::types::{ConfigId, ConfigSummary, LogCollection, UploadFile};
use crate::auth::AuthClient;
use crate::config::{self, ConsoleConfig};
use crate::flows::data_view::{self, DataUpload, DataView, DataViewState};
use crate::flows::history::ConfigHistory;
use crate::flows::logs::{LogViewer, PollOutcome};
use crate::flows::trigger::JobTrigger;
use crate::flows::{FlowError, dashboard};
use crate::router::{GuardDecision, Route, RouteGuard};
use crate::session::SessionStore;
use crate::storage::{FileStorage, Storage};

/// Output format for listing commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            Some("csv") => Self::Csv,
            _ => Self::Table,
        }
    }
}

// ---------------------------------------------------------------------------
// Console context
// ---------------------------------------------------------------------------

/// Everything a command needs: resolved config, session and API client.
pub struct Console {
    config: ConsoleConfig,
    session: SessionStore,
    api: ApiClient,
}

impl Console {
    /// Open the console against the on-disk storage named by the config.
    pub fn open() -> Result<Self> {
        let config = config::load();
        let path = config
            .storage_path()
            .or_else(FileStorage::default_path)
            .context("could not determine storage location")?;
        let storage: Arc<dyn Storage> = Arc::new(FileStorage::new(path));
        Ok(Self::with_storage(config, storage))
    }

    pub fn with_storage(config: ConsoleConfig, storage: Arc<dyn Storage>) -> Self {
        let session = SessionStore::new(storage);
        let api = ApiClient::from_config(&config, session.clone());
        Self {
            config,
            session,
            api,
        }
    }

    fn auth(&self) -> AuthClient {
        AuthClient::new(self.api.clone(), self.session.clone())
    }

    /// Run the route guard; print the redirect when access is denied.
    fn enter(&self, route: Route) -> bool {
        match RouteGuard::new(self.session.clone()).check(route) {
            GuardDecision::Allow => true,
            GuardDecision::Redirect(to) => {
                println!(
                    "{} {} requires a session. Redirecting to {}: run `elt-console login`.",
                    "✗".red().bold(),
                    route.title(),
                    to.path()
                );
                false
            }
        }
    }
}

/// Turn a flow failure into the command's error.
fn flow_failed(err: FlowError) -> anyhow::Error {
    anyhow::anyhow!(err.to_string())
}

// ---------------------------------------------------------------------------
// elt-console login | logout | status
// ---------------------------------------------------------------------------

/// Exchange credentials for a session and show the landing dashboard.
pub fn run_login(username: Option<String>, password: Option<String>) -> Result<()> {
    let console = Console::open()?;

    let username = match username {
        Some(u) => u,
        None => prompt("Username")?,
    };
    let password = match password {
        Some(p) => p,
        None => prompt("Password")?,
    };

    match console.auth().login(&username, &password) {
        Ok(outcome) => {
            println!(
                "{} Signed in as {} ({})",
                "✓".green().bold(),
                username.bold(),
                outcome.role
            );
            print_landing(outcome.landing);
            Ok(())
        }
        Err(err) => Err(flow_failed(err)),
    }
}

/// Clear the session and the stored data preview.
pub fn run_logout() -> Result<()> {
    let console = Console::open()?;
    console.auth().logout()?;
    println!("{} Signed out", "✓".green().bold());
    Ok(())
}

/// Show the current session.
pub fn run_status() -> Result<()> {
    let console = Console::open()?;
    let auth = console.auth();

    println!("{}", "ELT Console Session".bold().cyan());
    println!("{}", "=".repeat(50));
    println!("  {} {}", "Backend:      ".bold(), console.api.base_url());

    match auth.landing() {
        Some(landing) => {
            println!("  {} {}", "Signed in:    ".bold(), "yes".green());
            println!(
                "  {} {}",
                "Role:         ".bold(),
                auth.role().unwrap_or_else(|| "unknown".to_string())
            );
            println!();
            print_landing(landing);
        }
        None => {
            println!("  {} {}", "Signed in:    ".bold(), "no".yellow());
            println!();
            println!("  {}", "Run `elt-console login` to start a session.".dimmed());
        }
    }
    Ok(())
}

fn print_landing(landing: Route) {
    println!("{}", landing.title().bold().cyan());
    let commands: &[(&str, &str)] = match landing {
        Route::Admin => &[
            ("trigger FILE", "upload a YAML config and start an ELT job"),
            ("logs", "follow the job log"),
            ("history", "browse configuration history"),
            ("coverage", "show the test coverage summary"),
        ],
        _ => &[
            ("preview FILE", "upload a YAML config and preview its data"),
            ("view", "show the last preview"),
            ("coverage", "show the test coverage summary"),
        ],
    };
    for (command, description) in commands {
        println!("  {:<14} {}", command, description.dimmed());
    }
}

fn prompt(label: &str) -> Result<String> {
    eprint!("{label}: ");
    io::stderr().flush().ok();
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .with_context(|| format!("failed to read {}", label.to_lowercase()))?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

// ---------------------------------------------------------------------------
// elt-console trigger
// ---------------------------------------------------------------------------

/// Upload a job configuration and trigger the ELT job.
pub fn run_trigger(file: Option<PathBuf>) -> Result<()> {
    let console = Console::open()?;
    if !console.enter(Route::Admin) {
        return Ok(());
    }

    let upload = read_upload(file.as_deref())?;
    let message = JobTrigger::new(console.api.clone())
        .trigger(upload.as_ref())
        .map_err(flow_failed)?;

    println!("{} {}", "✓".green().bold(), message);
    Ok(())
}

fn read_upload(path: Option<&Path>) -> Result<Option<UploadFile>> {
    path.map(UploadFile::from_path).transpose()
}

// ---------------------------------------------------------------------------
// elt-console logs
// ---------------------------------------------------------------------------

/// Follow the backend log. `cycles = 0` polls until interrupted.
pub fn run_logs(cycles: usize) -> Result<()> {
    let console = Console::open()?;
    if !console.enter(Route::Logs) {
        return Ok(());
    }

    let viewer = LogViewer::new(
        console.api.clone(),
        console.session.clone(),
        console.config.logs.poll_interval(),
    );

    let (tx, rx) = mpsc::channel::<Option<LogCollection>>();
    let poller = viewer
        .activate(move |outcome| {
            let update = match outcome {
                PollOutcome::Updated(collection) => Some(collection.clone()),
                PollOutcome::Failed(_) => None,
            };
            let _ = tx.send(update);
        })
        .map_err(flow_failed)?;

    println!(
        "{} (refreshing every {}s)",
        Route::Logs.title().bold().cyan(),
        viewer.interval().as_secs()
    );

    let mut seen = 0;
    while cycles == 0 || seen < cycles {
        let Ok(update) = rx.recv() else {
            break;
        };
        seen += 1;
        if let Some(collection) = update {
            print_logs(&collection);
        }
    }

    poller.stop();
    Ok(())
}

fn print_logs(collection: &LogCollection) {
    println!();
    println!(
        "{}",
        format!(
            "── {} · {} lines ──",
            chrono::Local::now().format("%H:%M:%S"),
            collection.len()
        )
        .dimmed()
    );
    if collection.is_empty() {
        println!("  {}", "No log lines yet.".yellow());
    }
    for line in collection.display_lines() {
        println!("{}", colorize_log_line(line));
    }
}

fn colorize_log_line(line: &str) -> colored::ColoredString {
    let upper = line.to_ascii_uppercase();
    if upper.contains("ERROR") || upper.contains("CRITICAL") {
        line.red()
    } else if upper.contains("WARN") {
        line.yellow()
    } else {
        line.normal()
    }
}

// ---------------------------------------------------------------------------
// elt-console history
// ---------------------------------------------------------------------------

/// List configuration history, or show one configuration in full.
pub fn run_history(id: Option<String>) -> Result<()> {
    let console = Console::open()?;
    if !console.enter(Route::ConfigHistory) {
        return Ok(());
    }

    let mut history = ConfigHistory::new(console.api.clone(), console.session.clone());
    history.activate().map_err(flow_failed)?;

    match id {
        Some(raw) => {
            let id = ConfigId::parse(&raw);
            let detail = history.view_detail(&id).map_err(flow_failed)?;
            println!("{}", format!("Configuration {id}").bold().cyan());
            println!("{}", "=".repeat(50));
            println!("{}", detail.display_text());
        }
        None => print_history_table(history.configs()),
    }
    Ok(())
}

fn print_history_table(configs: &[ConfigSummary]) {
    if configs.is_empty() {
        println!("{}", "No configurations uploaded yet.".yellow());
        return;
    }

    println!("{}", Route::ConfigHistory.title().bold().cyan());
    println!("{}", "=".repeat(72));
    println!(
        "  {:<8} {:>7} {:<17} Preview",
        "ID", "Version", "Uploaded"
    );
    println!("  {}", "-".repeat(70));

    for (i, config) in configs.iter().enumerate() {
        let preview = config
            .yaml_preview
            .as_deref()
            .unwrap_or("")
            .replace(['\r', '\n'], " ");
        let line = format!(
            "  {:<8} {:>7} {:<17} {}",
            truncate(&config.id.to_string(), 8),
            config
                .version
                .map(|v| v.to_string())
                .unwrap_or_else(|| "-".to_string()),
            config.timestamp.as_deref().unwrap_or("-"),
            truncate(&preview, 36),
        );
        if i % 2 == 0 {
            println!("{line}");
        } else {
            println!("{}", line.dimmed());
        }
    }

    println!();
    println!(
        "  {}",
        "Run `elt-console history --id ID` to show a full configuration.".dimmed()
    );
}

// ---------------------------------------------------------------------------
// elt-console preview | view
// ---------------------------------------------------------------------------

/// Upload a file for preview, then show the stored result.
pub fn run_preview(file: Option<PathBuf>, format: OutputFormat) -> Result<()> {
    let console = Console::open()?;
    if !console.enter(Route::User) {
        return Ok(());
    }

    let upload = read_upload(file.as_deref())?;
    let next = DataUpload::new(console.api.clone(), console.session.clone())
        .upload_and_preview(upload.as_ref())
        .map_err(flow_failed)?;

    show_data_view(&console, next, None, format)
}

/// Show the stored preview, optionally filtered.
pub fn run_view(filter: Option<String>, format: OutputFormat) -> Result<()> {
    let console = Console::open()?;
    show_data_view(&console, Route::DataView, filter.as_deref(), format)
}

fn show_data_view(
    console: &Console,
    route: Route,
    filter: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    if !console.enter(route) {
        return Ok(());
    }

    let mut view = match data_view::load_view(console.session.storage().as_ref()) {
        DataViewState::Ready(view) => view,
        DataViewState::Empty { message } => {
            println!("{}", message.yellow());
            return Ok(());
        }
    };
    if let Some(term) = filter {
        view.apply_filter(term);
    }

    match format {
        OutputFormat::Json => print_view_json(&view)?,
        OutputFormat::Csv => print_view_csv(&view),
        OutputFormat::Table => print_view_table(&view),
    }
    Ok(())
}

fn print_view_table(view: &DataView) {
    println!("{}", Route::DataView.title().bold().cyan());
    if !view.search_term().is_empty() {
        println!(
            "  {} \"{}\" ({} of {} rows)",
            "Filter:".bold(),
            view.search_term(),
            view.filtered_len(),
            view.rows().len()
        );
    }

    let columns = view.columns();
    if columns.is_empty() {
        println!("  {}", "The preview has no columns.".yellow());
        return;
    }

    let widths: Vec<usize> = columns
        .iter()
        .map(|column| {
            view.filtered_rows()
                .map(|row| data_view::cell_text(row.get(column)).chars().count())
                .chain(std::iter::once(column.chars().count()))
                .max()
                .unwrap_or(0)
                .min(MAX_CELL_WIDTH)
        })
        .collect();

    let header: Vec<String> = columns
        .iter()
        .zip(&widths)
        .map(|(column, &width)| pad(&truncate(column, width), width))
        .collect();
    println!("  {}", header.join("  ").bold());
    let rule = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
    println!("  {}", "-".repeat(rule));

    for (i, row) in view.filtered_rows().enumerate() {
        let cells: Vec<String> = columns
            .iter()
            .zip(&widths)
            .map(|(column, &width)| {
                let text = data_view::cell_text(row.get(column));
                pad(&truncate(&text, width), width)
            })
            .collect();
        let line = format!("  {}", cells.join("  "));
        if i % 2 == 0 {
            println!("{line}");
        } else {
            println!("{}", line.dimmed());
        }
    }

    if view.filtered_len() == 0 {
        println!("  {}", "No rows match the filter.".yellow());
    }
}

fn print_view_json(view: &DataView) -> Result<()> {
    let value = serde_json::json!({
        "columns": view.columns(),
        "search_term": view.search_term(),
        "rows": view.filtered_rows().collect::<Vec<_>>(),
    });
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn print_view_csv(view: &DataView) {
    let header: Vec<String> = view.columns().iter().map(|c| csv_field(c)).collect();
    println!("{}", header.join(","));
    for row in view.filtered_rows() {
        let cells: Vec<String> = view
            .columns()
            .iter()
            .map(|column| csv_field(&data_view::cell_text(row.get(column))))
            .collect();
        println!("{}", cells.join(","));
    }
}

// ---------------------------------------------------------------------------
// elt-console coverage | health
// ---------------------------------------------------------------------------

/// Show the backend's test coverage summary.
pub fn run_coverage() -> Result<()> {
    let console = Console::open()?;
    if !console.enter(Route::User) {
        return Ok(());
    }

    match dashboard::coverage_summary(&console.api).map_err(flow_failed)? {
        Some(percent) => println!("  {} {}%", "Coverage:".bold(), percent),
        None => println!("{}", "The backend did not report a coverage figure.".yellow()),
    }
    Ok(())
}

/// Check backend reachability and local state.
pub fn run_health() -> Result<()> {
    let console = Console::open()?;

    println!("{}", "ELT Console Health Check".bold().cyan());
    println!("{}", "=".repeat(50));

    // 1. Backend
    match dashboard::backend_health(&console.api) {
        Ok(status) => {
            let detail = format!("{} ({status})", console.api.base_url());
            print_health_item("Backend", true, &detail);
        }
        Err(err) => print_health_item("Backend", false, &err.to_string()),
    }

    // 2. Session
    let auth = console.auth();
    print_health_item(
        "Session",
        auth.is_authenticated(),
        &match auth.role() {
            Some(role) if auth.is_authenticated() => format!("signed in ({role})"),
            _ => "not signed in".to_string(),
        },
    );

    // 3. Config file
    let config_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    print_health_item(
        "Config file",
        config_exists,
        if config_exists {
            "~/.elt-console/config.toml"
        } else {
            "using defaults"
        },
    );

    // 4. Activity log
    let log_detail = if console.config.logging.enabled {
        let count = console
            .config
            .activity_log_path()
            .map(|path| ActivityLog::new(path).read_all().len())
            .unwrap_or(0);
        format!("{count} entries")
    } else {
        "disabled".to_string()
    };
    print_health_item("Activity log", console.config.logging.enabled, &log_detail);

    Ok(())
}

fn print_health_item(name: &str, ok: bool, detail: &str) {
    let status = if ok {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    println!("  {} {:<16} {}", status, name, detail.dimmed());
}

// ---------------------------------------------------------------------------
// elt-console activity
// ---------------------------------------------------------------------------

/// Show the most recent recorded backend requests.
pub fn run_activity(limit: usize, format: OutputFormat) -> Result<()> {
    let config = config::load();
    let path = config
        .activity_log_path()
        .or_else(ActivityLog::default_path)
        .context("could not determine activity log location")?;
    let entries = ActivityLog::new(path).read_recent(limit);

    if entries.is_empty() {
        println!(
            "{}",
            "No activity recorded. Enable it with `elt-console config set logging.enabled true`."
                .yellow()
        );
        return Ok(());
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
        OutputFormat::Csv => print_activity_csv(&entries),
        OutputFormat::Table => print_activity_table(&entries),
    }
    Ok(())
}

fn print_activity_table(entries: &[ActivityEntry]) {
    println!("{}", "Recent Backend Requests".bold().cyan());
    println!("{}", "=".repeat(60));
    println!(
        "  {:<20} {:<6} {:<22} {:>6} {:>8}",
        "Time", "Method", "Path", "Status", "Latency"
    );
    println!("  {}", "-".repeat(66));

    for entry in entries {
        let time = chrono::DateTime::parse_from_rfc3339(&entry.timestamp)
            .map(|t| t.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|_| entry.timestamp.clone());
        let status = entry
            .status
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string());
        let line = format!(
            "  {:<20} {:<6} {:<22} {:>6} {:>6}ms",
            time,
            entry.method,
            truncate(&entry.path, 22),
            status,
            entry.latency_ms,
        );
        if entry.success {
            println!("{line}");
        } else {
            println!("{}", line.red());
        }
    }
}

fn print_activity_csv(entries: &[ActivityEntry]) {
    println!("timestamp,method,path,status,success,latency_ms,error");
    for entry in entries {
        println!(
            "{},{},{},{},{},{},{}",
            entry.timestamp,
            entry.method,
            csv_field(&entry.path),
            entry.status.map(|s| s.to_string()).unwrap_or_default(),
            entry.success,
            entry.latency_ms,
            csv_field(entry.error.as_deref().unwrap_or("")),
        );
    }
}

// ---------------------------------------------------------------------------
// elt-console config show | init | set | reset
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML.
pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective ELT Console Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    print_source("~/.elt-console/config.toml", global_exists);
    print_source(".elt-console.toml", project_exists);
    println!(
        "  {} {}",
        "·".dimmed(),
        "ELT_CONSOLE_* environment variables".dimmed()
    );

    Ok(())
}

fn print_source(name: &str, exists: bool) {
    if exists {
        println!("  {} {}", "✓".green(), name.dimmed());
    } else {
        println!("  {} {}", "·".dimmed(), format!("{name} (not found)").dimmed());
    }
}

/// Initialize a default config file at `~/.elt-console/config.toml`.
pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!(
        "{} Config written to {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

/// Set a single configuration value in the global config file.
pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    config::set_config_value(key, value)?;
    println!("{} Set {} = {}", "✓".green().bold(), key.bold(), value);
    Ok(())
}

/// Reset configuration to defaults.
pub fn run_config_reset() -> Result<()> {
    let path = config::reset_config()?;
    println!(
        "{} Config reset to defaults at {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

const MAX_CELL_WIDTH: usize = 30;

/// Truncate a string to `max_len` characters, appending "…" if truncated.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

/// Left-align `s` in a field of `width` characters.
fn pad(s: &str, width: usize) -> String {
    let len = s.chars().count();
    format!("{s}{}", " ".repeat(width.saturating_sub(len)))
}

/// Quote a CSV field when it contains a separator, quote or line break.
fn csv_field(s: &str) -> String {
    if s.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

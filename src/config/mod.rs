/// Configuration system for elt-console.
///
/// Provides a layered configuration hierarchy:
///
/// 1. **Built-in defaults**: hardcoded in [`schema::ConsoleConfig::default()`]
/// 2. **User global config**: `~/.elt-console/config.toml`
/// 3. **Project local config**: `.elt-console.toml` in the current directory
/// 4. **Environment variables**: `ELT_CONSOLE_*` overrides (highest precedence)
///
/// Later layers override earlier ones. A missing or malformed TOML file is
/// skipped and the previous layer stays in effect.
///
/// # Usage
///
/// ```rust,ignore
/// use elt_console::config;
///
/// let cfg = config::load();
/// println!("backend: {}", cfg.backend.base_url);
/// ```
pub mod schema;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub use schema::ConsoleConfig;

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved console configuration.
///
/// Merges all layers in order: defaults → global TOML → project TOML → env
/// vars.
pub fn load() -> ConsoleConfig {
    let mut config = load_layers(&[global_config_path(), project_config_path()]);

    // Layer 4: environment variable overrides
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    config
}

/// Resolve the built-in defaults overlaid with each TOML file in order.
///
/// Files are merged key by key, so a layer only overrides what it sets.
/// Missing or malformed files are skipped.
pub fn load_layers(paths: &[Option<PathBuf>]) -> ConsoleConfig {
    let Ok(mut merged) = toml::Value::try_from(ConsoleConfig::default()) else {
        return ConsoleConfig::default();
    };

    for layer in paths.iter().filter_map(|path| load_toml_file(path.as_deref())) {
        merge_values(&mut merged, layer);
    }

    merged.try_into().unwrap_or_default()
}

/// Load a TOML file from the given path (if it exists).
///
/// Returns `None` if the path is `None`, the file doesn't exist, or the
/// content is malformed.
fn load_toml_file(path: Option<&Path>) -> Option<toml::Value> {
    let content = fs::read_to_string(path?).ok()?;
    content.parse::<toml::Table>().ok().map(toml::Value::Table)
}

/// Deep-merge `overlay` into `base`. Tables merge recursively; any other
/// value in the overlay replaces the base value.
fn merge_values(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

/// Path to the user global config: `~/.elt-console/config.toml`.
fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".elt-console").join("config.toml"))
}

/// Path to the project local config: `.elt-console.toml` in the current
/// directory.
fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".elt-console.toml"))
}

/// Return the path to the global config file for display/init purposes.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// Return the path to the project config file for display purposes.
pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides (highest precedence layer).
///
/// Supported variables:
/// - `ELT_CONSOLE_BASE_URL`: backend base URL
/// - `ELT_CONSOLE_TIMEOUT_MS`: request timeout, `0` for none
/// - `ELT_CONSOLE_POLL_INTERVAL_SECS`: log viewer refresh interval
/// - `ELT_CONSOLE_STORAGE`: storage file path
/// - `ELT_CONSOLE_LOGGING`: activity log switch (`1`/`true`/`yes`/`on`)
/// - `ELT_CONSOLE_LOG_PATH`: activity log path
///
/// `lookup` abstracts `std::env::var` so tests don't touch the process
/// environment.
fn apply_env_overrides(config: &mut ConsoleConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(val) = lookup("ELT_CONSOLE_BASE_URL")
        && !val.trim().is_empty()
    {
        config.backend.base_url = val.trim().to_string();
    }
    if let Some(val) = lookup("ELT_CONSOLE_TIMEOUT_MS")
        && let Ok(ms) = val.trim().parse::<u64>()
    {
        config.backend.timeout_ms = ms;
    }
    if let Some(val) = lookup("ELT_CONSOLE_POLL_INTERVAL_SECS")
        && let Ok(secs) = val.trim().parse::<u64>()
    {
        config.logs.poll_interval_secs = secs;
    }
    if let Some(val) = lookup("ELT_CONSOLE_STORAGE")
        && !val.trim().is_empty()
    {
        config.storage.path = val.trim().to_string();
    }
    if let Some(val) = lookup("ELT_CONSOLE_LOGGING") {
        config.logging.enabled = is_truthy(&val);
    }
    if let Some(val) = lookup("ELT_CONSOLE_LOG_PATH")
        && !val.trim().is_empty()
    {
        config.logging.path = val.trim().to_string();
    }
}

/// Check if a string value represents a truthy boolean.
fn is_truthy(val: &str) -> bool {
    matches!(
        val.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// ---------------------------------------------------------------------------
// Config init / set / reset
// ---------------------------------------------------------------------------

/// Write the default annotated config to `~/.elt-console/config.toml`.
///
/// Creates the directory if it doesn't exist. Returns an error if the file
/// already exists (use `force = true` to overwrite).
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create ~/.elt-console/ directory")?;
    }

    fs::write(&path, ConsoleConfig::default_toml()).context("failed to write config file")?;

    Ok(path)
}

/// Set a single config key to a value in the global config file.
///
/// Reads the current global config (or defaults), updates the specified key,
/// and writes the result back. Supports dotted keys like `backend.base_url`.
pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let path = global_config_path().context("could not determine home directory")?;

    let current = if path.exists() {
        fs::read_to_string(&path).context("failed to read config file")?
    } else {
        toml::to_string_pretty(&ConsoleConfig::default())
            .context("failed to serialize default config")?
    };

    let mut root: toml::Value =
        toml::from_str(&current).context("failed to parse config as TOML value")?;
    set_toml_value(&mut root, key, value)?;

    let output = toml::to_string_pretty(&root).context("failed to serialize updated config")?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    fs::write(&path, output).context("failed to write config file")?;

    Ok(())
}

/// Set a value in a TOML value tree using a dotted key path.
fn set_toml_value(root: &mut toml::Value, key: &str, raw_value: &str) -> Result<()> {
    let parts: Vec<&str> = key.split('.').filter(|p| !p.is_empty()).collect();
    let Some((&leaf, sections)) = parts.split_last() else {
        anyhow::bail!("empty config key");
    };

    // Navigate to the parent table
    let mut current = root;
    for &part in sections {
        current = current
            .get_mut(part)
            .with_context(|| format!("config key not found: section '{part}' in '{key}'"))?;
    }

    let table = current.as_table_mut().with_context(|| {
        format!(
            "expected table at '{}'",
            key.rsplit_once('.').map(|(s, _)| s).unwrap_or("")
        )
    })?;

    // Parse according to the type of the existing value
    let new_value = match table.get(leaf) {
        Some(toml::Value::Boolean(_)) => toml::Value::Boolean(is_truthy(raw_value)),
        Some(toml::Value::Integer(_)) => {
            let n: i64 = raw_value
                .trim()
                .parse()
                .with_context(|| format!("expected integer for '{key}', got '{raw_value}'"))?;
            toml::Value::Integer(n)
        }
        Some(toml::Value::Float(_)) => {
            let f: f64 = raw_value
                .trim()
                .parse()
                .with_context(|| format!("expected float for '{key}', got '{raw_value}'"))?;
            toml::Value::Float(f)
        }
        Some(toml::Value::String(_)) => toml::Value::String(raw_value.to_string()),
        Some(_) => anyhow::bail!("'{key}' is a section, not a value"),
        None => anyhow::bail!("unknown config key: '{key}'"),
    };

    table.insert(leaf.to_string(), new_value);
    Ok(())
}

/// Reset the global config to defaults (overwrite the file).
pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// Show the effective (fully resolved) config as TOML.
pub fn show_effective_config() -> Result<String> {
    let config = load();
    toml::to_string_pretty(&config).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use elt_console::cli;

#[derive(Debug, Parser)]
#[command(name = "elt-console")]
#[command(about = "Operator console for the ELT job backend")]
struct App {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Sign in and store the session token
    Login {
        /// Username (prompted when omitted)
        #[arg(short, long)]
        username: Option<String>,
        /// Password (prompted when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Clear the stored session and data preview
    Logout,
    /// Show the current session and its dashboard
    Status,
    /// Upload a YAML job configuration and trigger the ELT job
    Trigger {
        /// Job configuration file
        file: Option<PathBuf>,
    },
    /// Follow the backend job log
    Logs {
        /// Stop after N refreshes (0 polls until interrupted)
        #[arg(long, default_value = "0")]
        cycles: usize,
    },
    /// Browse uploaded configuration history
    History {
        /// Show the full configuration with this id
        #[arg(long)]
        id: Option<String>,
    },
    /// Upload a YAML file and preview the data it produces
    Preview {
        /// Job configuration file
        file: Option<PathBuf>,
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Show the last data preview
    View {
        /// Keep only rows with a cell containing this term (case-insensitive)
        #[arg(long)]
        filter: Option<String>,
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Show the backend's test coverage summary
    Coverage,
    /// Check backend reachability, session and config
    Health,
    /// Show recently recorded backend requests
    Activity {
        /// Number of entries to show
        #[arg(long, default_value = "20")]
        limit: usize,
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Write a default config file to ~/.elt-console/config.toml
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
    /// Set a single value, e.g. `backend.base_url http://host:5000`
    Set { key: String, value: String },
    /// Reset the config file to defaults
    Reset,
}

fn main() -> Result<()> {
    let app = App::parse();

    match app.command {
        Commands::Login { username, password } => cli::run_login(username, password),
        Commands::Logout => cli::run_logout(),
        Commands::Status => cli::run_status(),
        Commands::Trigger { file } => cli::run_trigger(file),
        Commands::Logs { cycles } => cli::run_logs(cycles),
        Commands::History { id } => cli::run_history(id),
        Commands::Preview { file, format } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_preview(file, fmt)
        }
        Commands::View { filter, format } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_view(filter, fmt)
        }
        Commands::Coverage => cli::run_coverage(),
        Commands::Health => cli::run_health(),
        Commands::Activity { limit, format } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_activity(limit, fmt)
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init { force } => cli::run_config_init(force),
            ConfigAction::Set { key, value } => cli::run_config_set(&key, &value),
            ConfigAction::Reset => cli::run_config_reset(),
        },
    }
}

//! CLI argument parsing and config file support.
//!
//! The daemon can be configured via CLI flags, a JSON config file,
//! environment variables, or a combination (CLI overrides file
//! overrides environment).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use wordwarden_types::config::AppConfig;

// ---------------------------------------------------------------------------
// CLI arguments (manual parsing, no clap dependency)
// ---------------------------------------------------------------------------

/// Parsed command-line arguments.
pub struct CliArgs {
    pub data_dir: Option<PathBuf>,
    pub server_url: Option<String>,
    pub client_id: Option<String>,
    pub server_id: Option<String>,
    pub channel_name: Option<String>,
    pub refresh_secs: Option<u64>,
    pub config_path: Option<PathBuf>,
}

impl CliArgs {
    /// Parses CLI arguments from `std::env::args`.
    pub fn parse_from_env() -> Self {
        let args: Vec<String> = std::env::args().collect();
        let mut cli = Self {
            data_dir: None,
            server_url: None,
            client_id: None,
            server_id: None,
            channel_name: None,
            refresh_secs: None,
            config_path: None,
        };

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--data-dir" => {
                    i += 1;
                    cli.data_dir = args.get(i).map(PathBuf::from);
                }
                "--server-url" => {
                    i += 1;
                    cli.server_url = args.get(i).cloned();
                }
                "--client-id" => {
                    i += 1;
                    cli.client_id = args.get(i).cloned();
                }
                "--server-id" => {
                    i += 1;
                    cli.server_id = args.get(i).cloned();
                }
                "--channel" => {
                    i += 1;
                    cli.channel_name = args.get(i).cloned();
                }
                "--refresh-secs" => {
                    i += 1;
                    cli.refresh_secs = args.get(i).and_then(|s| s.parse().ok());
                }
                "--config" => {
                    i += 1;
                    cli.config_path = args.get(i).map(PathBuf::from);
                }
                "--help" | "-h" => {
                    print_help();
                    std::process::exit(0);
                }
                other => {
                    eprintln!("unknown argument: {other}");
                    eprintln!("use --help for usage information");
                    std::process::exit(1);
                }
            }
            i += 1;
        }

        cli
    }
}

// ---------------------------------------------------------------------------
// Config file (JSON)
// ---------------------------------------------------------------------------

/// JSON config file format.
///
/// Example `wordwarden.json`:
/// ```json
/// {
///   "data_dir": "/opt/wordwarden/data",
///   "server_url": "wss://censor.example.net/sync",
///   "client_id": "channel-client-1",
///   "server_id": "central-1",
///   "channel_name": "somechannel",
///   "refresh_interval_secs": 60
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DaemonConfigFile {
    pub data_dir: Option<String>,
    pub server_url: Option<String>,
    pub client_id: Option<String>,
    pub server_id: Option<String>,
    pub channel_name: Option<String>,
    pub refresh_interval_secs: Option<u64>,
}

impl DaemonConfigFile {
    /// Loads the config file.
    pub fn load(path: &Path) -> Result<Self, String> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read config file: {e}"))?;

        serde_json::from_str(&text).map_err(|e| format!("invalid config JSON: {e}"))
    }
}

// ---------------------------------------------------------------------------
// Resolved config
// ---------------------------------------------------------------------------

/// Fully resolved daemon configuration.
pub struct DaemonConfig {
    pub data_dir: PathBuf,
    pub app: AppConfig,
}

impl DaemonConfig {
    /// Resolves CLI > config file > environment > defaults.
    ///
    /// Validation of the result (missing identity fields, zero
    /// intervals) happens in `AppConfig::validate` and is fatal at
    /// startup.
    pub fn resolve(cli: &CliArgs, file: &DaemonConfigFile) -> Self {
        let data_dir = cli
            .data_dir
            .clone()
            .or_else(|| file.data_dir.clone().map(PathBuf::from))
            .or_else(|| std::env::var("WORDWARDEN_DATA_DIR").ok().map(PathBuf::from))
            .unwrap_or_else(default_data_dir);

        let mut app = AppConfig {
            server_url: resolve_value(&cli.server_url, &file.server_url, "WORDWARDEN_SERVER_URL"),
            client_id: resolve_value(&cli.client_id, &file.client_id, "WORDWARDEN_CLIENT_ID"),
            server_id: resolve_value(&cli.server_id, &file.server_id, "WORDWARDEN_SERVER_ID"),
            channel_name: resolve_value(&cli.channel_name, &file.channel_name, "WORDWARDEN_CHANNEL"),
            ..AppConfig::default()
        };

        if let Some(secs) = cli.refresh_secs.or(file.refresh_interval_secs) {
            app.refresh_interval_secs = secs;
        }

        Self { data_dir, app }
    }
}

fn resolve_value(cli: &Option<String>, file: &Option<String>, env_key: &str) -> String {
    cli.clone()
        .or_else(|| file.clone())
        .or_else(|| std::env::var(env_key).ok())
        .unwrap_or_default()
}

/// Platform-specific default data directory.
fn default_data_dir() -> PathBuf {
    if cfg!(target_os = "linux") {
        if let Some(home) = dirs::home_dir() {
            return home.join(".wordwarden");
        }
    }
    if let Some(data) = dirs::data_dir() {
        return data.join("Wordwarden");
    }
    PathBuf::from("wordwarden-data")
}

fn print_help() {
    println!(
        r#"Wordwarden Daemon - chat whitelist censorship client

USAGE:
    wordwarden-daemon [OPTIONS]

OPTIONS:
    --data-dir <PATH>      Data directory (default: platform-specific)
    --server-url <URL>     Central whitelist server WebSocket URL
    --client-id <ID>       Client identity for the sync handshake
    --server-id <ID>       Expected server identity on push updates
    --channel <NAME>       Chat channel this client filters
    --refresh-secs <SECS>  Seconds between dataset refresh checks
    --config <PATH>        Load settings from JSON config file
    -h, --help             Show this help

ENVIRONMENT:
    WORDWARDEN_DATA_DIR    Data directory
    WORDWARDEN_SERVER_URL  Central server WebSocket URL
    WORDWARDEN_CLIENT_ID   Client identity
    WORDWARDEN_SERVER_ID   Expected server identity
    WORDWARDEN_CHANNEL     Chat channel name
    RUST_LOG               Log level filter (default: info)
"#
    );
}

//! Wordwarden Daemon -- headless whitelist censorship client.
//!
//! Usage:
//!
//!   wordwarden-daemon [OPTIONS]
//!
//! Options:
//!
//!   --data-dir <PATH>      Data directory (default: platform-specific)
//!   --server-url <URL>     Central whitelist server WebSocket URL
//!   --client-id <ID>       Client identity for the sync handshake
//!   --server-id <ID>       Expected server identity on push updates
//!   --channel <NAME>       Chat channel this client filters
//!   --refresh-secs <SECS>  Seconds between dataset refresh checks
//!   --config <PATH>        Load config from JSON file
//!
//! The daemon loads the persisted datasets, keeps the sync link to
//! the central server alive, refreshes datasets from staged
//! snapshots, and exposes message evaluation to the local HTTP layer
//! through the node handle. It runs until interrupted with Ctrl+C.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use wordwarden_node::{run_refresh_task, CensorNode, WhitelistRequester};
use wordwarden_storage::{initialize_datafiles, load_dataset, DataPaths, RequestStore};
use wordwarden_sync::{SyncClient, SyncClientConfig};

mod config;

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() {
    // Tracing / logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    print_banner();

    // Parse CLI arguments and merge the config file if provided.
    let cli = config::CliArgs::parse_from_env();
    let file = match &cli.config_path {
        Some(path) => match config::DaemonConfigFile::load(path) {
            Ok(file) => file,
            Err(e) => {
                tracing::error!("failed to load config file: {e}");
                std::process::exit(1);
            }
        },
        None => config::DaemonConfigFile::default(),
    };
    let daemon_config = config::DaemonConfig::resolve(&cli, &file);

    // Run the daemon.
    if let Err(e) = run_daemon(daemon_config).await {
        tracing::error!("daemon error: {e}");
        std::process::exit(1);
    }
}

// ---------------------------------------------------------------------------
// Daemon main logic
// ---------------------------------------------------------------------------

async fn run_daemon(cfg: config::DaemonConfig) -> Result<(), String> {
    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------

    cfg.app
        .validate()
        .map_err(|e| format!("invalid configuration: {e}"))?;

    let paths = DataPaths::new(&cfg.data_dir);
    tracing::info!(data_dir = %cfg.data_dir.display(), "data directory resolved");

    // -----------------------------------------------------------------------
    // 2. Datafiles
    // -----------------------------------------------------------------------

    initialize_datafiles(&paths).map_err(|e| format!("datafile initialization failed: {e}"))?;

    let dataset = load_dataset(&paths).map_err(|e| format!("dataset load failed: {e}"))?;
    tracing::info!(
        version = dataset.version,
        dictionary = dataset.dictionary.len(),
        bulk = dataset.sorted_bulk.len(),
        "datasets loaded"
    );

    let request_store = Arc::new(
        RequestStore::load(paths.request_statuses_file())
            .map_err(|e| format!("request state load failed: {e}"))?,
    );
    tracing::info!(usernames = request_store.len(), "request state loaded");

    // -----------------------------------------------------------------------
    // 3. Sync client
    // -----------------------------------------------------------------------

    let (update_tx, update_rx) = mpsc::channel(cfg.app.update_queue_capacity);
    let (announce_tx, mut announce_rx) = mpsc::channel::<String>(cfg.app.update_queue_capacity);

    let sync = Arc::new(SyncClient::new(
        SyncClientConfig::from_app(&cfg.app),
        update_tx,
        announce_tx,
    ));

    // -----------------------------------------------------------------------
    // 4. Node
    // -----------------------------------------------------------------------

    let node = Arc::new(CensorNode::new(
        cfg.app.clone(),
        dataset,
        Arc::clone(&request_store),
        Arc::clone(&sync) as Arc<dyn WhitelistRequester>,
        update_rx,
    ));

    // -----------------------------------------------------------------------
    // 5. Background tasks
    // -----------------------------------------------------------------------

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let sync_handle = {
        let sync = Arc::clone(&sync);
        let shutdown = shutdown_rx.clone();
        tokio::spawn(async move { sync.run(shutdown).await })
    };

    let refresh_handle = tokio::spawn(run_refresh_task(
        Arc::clone(&node),
        paths.clone(),
        shutdown_rx.clone(),
    ));

    // Announcements are consumed by the chat-platform bot, which
    // lives outside this process; surface them in the log.
    let announce_handle = {
        let mut shutdown = shutdown_rx.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    line = announce_rx.recv() => match line {
                        Some(line) => tracing::info!(%line, "channel announcement"),
                        None => break,
                    },
                    _ = shutdown.changed() => {
                        if *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }
        })
    };

    // -----------------------------------------------------------------------
    // 6. Status summary
    // -----------------------------------------------------------------------

    println!();
    println!("============================================================");
    println!("  Wordwarden Daemon running");
    println!("============================================================");
    println!("  Channel:      {}", cfg.app.channel_name);
    println!("  Sync server:  {}", cfg.app.server_url);
    println!("  Client id:    {}", cfg.app.client_id);
    println!("  Refresh:      every {}s", cfg.app.refresh_interval_secs);
    println!("  Data dir:     {}", cfg.data_dir.display());
    println!("============================================================");
    println!("  Press Ctrl+C to stop");
    println!("============================================================");
    println!();

    // -----------------------------------------------------------------------
    // 7. Wait for shutdown signal
    // -----------------------------------------------------------------------

    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("received Ctrl+C, shutting down..."),
        Err(e) => tracing::error!(%e, "failed to listen for Ctrl+C, shutting down"),
    }

    let _ = shutdown_tx.send(true);

    // Brief grace period for in-flight requests and task exits.
    tokio::time::sleep(std::time::Duration::from_millis(500)).await;

    sync_handle.abort();
    refresh_handle.abort();
    announce_handle.abort();

    tracing::info!("daemon stopped");
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn print_banner() {
    println!(
        r#"
 __        __           _                       _
 \ \      / /__  _ __ _| |_      ____ _ _ __ __| | ___ _ __
  \ \ /\ / / _ \| '__/ _` \ \ /\ / / _` | '__/ _` |/ _ \ '_ \
   \ V  V / (_) | | | (_| |\ V  V / (_| | | | (_| |  __/ | | |
    \_/\_/ \___/|_|  \__,_| \_/\_/ \__,_|_|  \__,_|\___|_| |_|
                                             daemon v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}

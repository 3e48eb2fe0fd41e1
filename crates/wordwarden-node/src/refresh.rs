//! Dataset refresh coordinator.
//!
//! An external file-transfer collaborator stages incoming snapshots
//! under the data directory's `staging/` folder. On each tick the
//! coordinator compares the staged version marker against the live
//! snapshot and, only when strictly newer, merges the staged files
//! over `remote/`, rebuilds the dataset from disk, and swaps it in
//! atomically (clearing the push overlay).
//!
//! An unreadable staged marker is a logged no-op: the system keeps
//! operating on stale data rather than failing requests.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use wordwarden_storage::{load_dataset, merge_snapshot, read_version, DataPaths};
use wordwarden_types::Result;

use crate::node::CensorNode;

/// What one refresh pass did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A newer snapshot was merged and installed.
    Refreshed { from: u64, to: u64 },
    /// The staged snapshot is not newer than the live one.
    UpToDate { version: u64 },
    /// No readable staged version marker; nothing was touched.
    MarkerUnreadable,
}

/// Runs one refresh pass against the staged snapshot.
pub fn refresh_from_staging(node: &CensorNode, paths: &DataPaths) -> Result<RefreshOutcome> {
    let marker = paths.staging_dir().join("version.json");

    let staged_version = match read_version(&marker) {
        Ok(version) => version,
        Err(e) => {
            tracing::debug!(%e, "no readable staged version marker, skipping refresh");
            return Ok(RefreshOutcome::MarkerUnreadable);
        }
    };

    let current = node.dataset_version();
    if staged_version <= current {
        tracing::debug!(staged_version, current, "staged snapshot not newer");
        return Ok(RefreshOutcome::UpToDate { version: current });
    }

    tracing::info!(from = current, to = staged_version, "newer snapshot staged, refreshing");
    merge_snapshot(&paths.staging_dir(), paths)?;

    let dataset = load_dataset(paths)?;
    node.install_dataset(dataset);

    Ok(RefreshOutcome::Refreshed {
        from: current,
        to: staged_version,
    })
}

/// Periodic driver for the refresh coordinator.
///
/// Spawned once by the daemon; ticks at the configured interval until
/// the shutdown signal fires. Refresh errors are logged, never fatal.
pub async fn run_refresh_task(
    node: Arc<CensorNode>,
    paths: DataPaths,
    mut shutdown: watch::Receiver<bool>,
) {
    let interval = Duration::from_secs(node.config().refresh_interval_secs);
    let mut tick = tokio::time::interval(interval);
    // The immediate first tick would race startup loading; skip it.
    tick.tick().await;

    tracing::info!(interval_secs = interval.as_secs(), "refresh coordinator started");

    loop {
        tokio::select! {
            _ = tick.tick() => {
                match refresh_from_staging(&node, &paths) {
                    Ok(RefreshOutcome::Refreshed { from, to }) => {
                        tracing::info!(from, to, "dataset refreshed");
                    }
                    Ok(_) => {}
                    Err(e) => tracing::warn!(%e, "refresh pass failed"),
                }
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    break;
                }
            }
        }
    }

    tracing::info!("refresh coordinator stopped");
}

//! Dataset file initialization, loading, and snapshot merging.
//!
//! Client-specific files may not exist on a fresh install and are
//! seeded with empty defaults. Core remote datasets must then load
//! cleanly: a missing or malformed file is fatal at startup.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use wordwarden_types::{Dataset, Result, WordwardenError};

use crate::files::{copy_atomic, read_json, write_json_atomic};
use crate::paths::{DataPaths, CLIENT_SEEDED_SETS, REMOTE_SET_NAMES};

/// The `version.json` document shape.
#[derive(Debug, Serialize, Deserialize)]
struct VersionMarker {
    version: u64,
}

// ---------------------------------------------------------------------------
// Initialization
// ---------------------------------------------------------------------------

/// Creates the directory layout and seeds missing client-specific
/// files with empty content.
///
/// Remote core datasets (blacklist, dictionary, prefixes, suffixes)
/// ship with the deployment and are not seeded here; their absence
/// surfaces as a fatal error in [`load_dataset`].
pub fn initialize_datafiles(paths: &DataPaths) -> Result<()> {
    for dir in [
        paths.data_dir().to_path_buf(),
        paths.remote_dir(),
        paths.local_dir(),
        paths.bulk_dir(),
        paths.staging_dir(),
    ] {
        fs::create_dir_all(&dir).map_err(|e| WordwardenError::StorageError {
            reason: format!("failed to create {}: {e}", dir.display()),
        })?;
    }

    for name in CLIENT_SEEDED_SETS {
        let path = paths.remote_set(name);
        if path.exists() {
            continue;
        }
        tracing::info!(file = %path.display(), "seeding missing datafile");
        if name == "nicknames" {
            write_json_atomic(&path, &HashMap::<String, String>::new())?;
        } else {
            write_json_atomic(&path, &Vec::<String>::new())?;
        }
    }

    let statuses = paths.request_statuses_file();
    if !statuses.exists() {
        tracing::info!(file = %statuses.display(), "seeding missing datafile");
        write_json_atomic(&statuses, &HashMap::<String, serde_json::Value>::new())?;
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Builds a [`Dataset`] snapshot from disk.
///
/// Every set member is lowercased on entry. The bulk folder's files
/// are unioned into one set. Nickname keys are lowercased; values
/// keep their display casing, and the derived membership set holds
/// the lowercase form of both.
pub fn load_dataset(paths: &DataPaths) -> Result<Dataset> {
    let mut sets: HashMap<&str, HashSet<String>> = HashMap::new();
    for name in REMOTE_SET_NAMES {
        let words: Vec<String> = read_json(&paths.remote_set(name))?;
        sets.insert(name, lowercase_set(words));
    }

    let sorted_bulk = load_bulk(&paths.bulk_dir())?;

    let raw_nicknames: HashMap<String, String> = read_json(&paths.nicknames_file())?;
    let mut nicknames = HashMap::with_capacity(raw_nicknames.len());
    let mut nicknames_set = HashSet::with_capacity(raw_nicknames.len() * 2);
    for (key, value) in raw_nicknames {
        nicknames_set.insert(key.to_lowercase());
        nicknames_set.insert(value.to_lowercase());
        nicknames.insert(key.to_lowercase(), value);
    }

    let version = load_version_lenient(&paths.version_file());

    let mut take = |name: &str| sets.remove(name).unwrap_or_default();

    Ok(Dataset {
        blacklist: take("blacklist"),
        custom: take("custom"),
        custom_legacy: take("custom_legacy"),
        dictionary: take("dictionary"),
        nicknames,
        nicknames_set,
        random_prefixes: take("random_prefixes"),
        random_suffixes: take("random_suffixes"),
        sorted_bulk,
        trusted_usernames: take("trusted_usernames"),
        usernames: take("usernames"),
        version,
    })
}

/// Unions every `*.json` array in the bulk folder.
fn load_bulk(bulk_dir: &Path) -> Result<HashSet<String>> {
    let mut combined = HashSet::new();

    let entries = fs::read_dir(bulk_dir).map_err(|e| WordwardenError::DataError {
        reason: format!("{} missing or unreadable: {e}", bulk_dir.display()),
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| WordwardenError::DataError {
            reason: format!("failed to list {}: {e}", bulk_dir.display()),
        })?;
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }
        let words: Vec<String> = read_json(&path)?;
        combined.extend(words.into_iter().map(|w| w.to_lowercase()));
    }

    Ok(combined)
}

/// Reads the version marker, tolerating absence and corruption.
///
/// Startup does not depend on the marker; the refresh coordinator
/// re-reads its staged counterpart strictly.
fn load_version_lenient(path: &Path) -> u64 {
    if !path.exists() {
        return 0;
    }
    match read_version(path) {
        Ok(version) => version,
        Err(e) => {
            tracing::warn!(%e, "version marker unreadable, assuming 0");
            0
        }
    }
}

/// Reads a `version.json` marker strictly.
pub fn read_version(path: &Path) -> Result<u64> {
    let marker: VersionMarker = read_json(path)?;
    Ok(marker.version)
}

fn lowercase_set(words: Vec<String>) -> HashSet<String> {
    words.into_iter().map(|w| w.to_lowercase()).collect()
}

// ---------------------------------------------------------------------------
// Snapshot merging
// ---------------------------------------------------------------------------

/// Merges a staged snapshot over the remote data directory.
///
/// Only files present in the staging directory are copied; each copy
/// is atomic. The caller rebuilds the in-memory dataset afterwards.
pub fn merge_snapshot(staging: &Path, paths: &DataPaths) -> Result<()> {
    let mut copied = 0usize;

    for name in REMOTE_SET_NAMES
        .iter()
        .copied()
        .chain(["nicknames", "version"])
    {
        let staged = staging.join(format!("{name}.json"));
        if !staged.exists() {
            continue;
        }
        copy_atomic(&staged, &paths.remote_set(name))?;
        copied += 1;
    }

    let staged_bulk = staging.join("bulk");
    if staged_bulk.is_dir() {
        let entries = fs::read_dir(&staged_bulk).map_err(|e| WordwardenError::StorageError {
            reason: format!("failed to list {}: {e}", staged_bulk.display()),
        })?;
        for entry in entries {
            let entry = entry.map_err(|e| WordwardenError::StorageError {
                reason: format!("failed to list {}: {e}", staged_bulk.display()),
            })?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let file_name = entry.file_name();
            copy_atomic(&path, &paths.bulk_dir().join(file_name))?;
            copied += 1;
        }
    }

    tracing::info!(files = copied, "snapshot merged over remote data");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Atomic JSON file I/O.
//!
//! All writes go through [`write_json_atomic`]: serialize → write a
//! dot-prefixed temp file in the same directory → fsync → rename.
//! If any step fails the original file is untouched.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use wordwarden_types::{Result, WordwardenError};

/// Reads and deserializes one JSON document.
///
/// Missing and malformed files are both errors; callers that tolerate
/// absence check `path.exists()` first.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path).map_err(|e| WordwardenError::DataError {
        reason: format!("{} missing or unreadable: {e}", path.display()),
    })?;

    serde_json::from_str(&raw).map_err(|e| WordwardenError::DataError {
        reason: format!("{} malformed: {e}", path.display()),
    })
}

/// Serializes and writes one JSON document atomically.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let payload = serde_json::to_vec(value).map_err(|e| WordwardenError::StorageError {
        reason: format!("failed to serialize {}: {e}", path.display()),
    })?;

    let tmp = tmp_path(path)?;

    {
        let mut file = fs::File::create(&tmp).map_err(|e| WordwardenError::StorageError {
            reason: format!("failed to create temp file for {}: {e}", path.display()),
        })?;

        file.write_all(&payload)
            .map_err(|e| WordwardenError::StorageError {
                reason: format!("failed to write temp file for {}: {e}", path.display()),
            })?;

        file.sync_all().map_err(|e| WordwardenError::StorageError {
            reason: format!("failed to fsync temp file for {}: {e}", path.display()),
        })?;
    }

    fs::rename(&tmp, path).map_err(|e| {
        // Best-effort cleanup of the temp file.
        let _ = fs::remove_file(&tmp);
        WordwardenError::StorageError {
            reason: format!("failed to rename temp file over {}: {e}", path.display()),
        }
    })?;

    Ok(())
}

/// Copies one file atomically: read source → write temp → fsync →
/// rename over the destination.
pub fn copy_atomic(src: &Path, dst: &Path) -> Result<()> {
    let payload = fs::read(src).map_err(|e| WordwardenError::StorageError {
        reason: format!("failed to read {}: {e}", src.display()),
    })?;

    let tmp = tmp_path(dst)?;

    {
        let mut file = fs::File::create(&tmp).map_err(|e| WordwardenError::StorageError {
            reason: format!("failed to create temp file for {}: {e}", dst.display()),
        })?;

        file.write_all(&payload)
            .map_err(|e| WordwardenError::StorageError {
                reason: format!("failed to write temp file for {}: {e}", dst.display()),
            })?;

        file.sync_all().map_err(|e| WordwardenError::StorageError {
            reason: format!("failed to fsync temp file for {}: {e}", dst.display()),
        })?;
    }

    fs::rename(&tmp, dst).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        WordwardenError::StorageError {
            reason: format!("failed to rename temp file over {}: {e}", dst.display()),
        }
    })?;

    Ok(())
}

/// Temp file path in the same directory as `path`, creating the
/// directory if needed.
fn tmp_path(path: &Path) -> Result<PathBuf> {
    let parent = path.parent().ok_or_else(|| WordwardenError::StorageError {
        reason: format!("{} has no parent directory", path.display()),
    })?;

    if !parent.exists() {
        fs::create_dir_all(parent).map_err(|e| WordwardenError::StorageError {
            reason: format!("failed to create {}: {e}", parent.display()),
        })?;
    }

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("document.json");

    Ok(parent.join(format!(".{file_name}.tmp")))
}

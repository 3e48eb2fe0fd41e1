//! On-disk layout of the data directory.
//!
//! ```text
//! <data_dir>/
//!   remote/              synced from the central authority
//!     blacklist.json
//!     custom.json
//!     custom_legacy.json
//!     dictionary.json
//!     nicknames.json
//!     random_prefixes.json
//!     random_suffixes.json
//!     trusted_usernames.json
//!     usernames.json
//!     version.json
//!     bulk/*.json        arbitrarily named, unioned at load
//!   local/               never synced
//!     request_statuses.json
//!   staging/             scratch area for incoming snapshots
//! ```

use std::path::{Path, PathBuf};

/// Resolved paths for every persisted document.
#[derive(Clone, Debug)]
pub struct DataPaths {
    data_dir: PathBuf,
}

impl DataPaths {
    /// Creates a layout rooted at `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Root data directory.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Directory of datasets synced from the central authority.
    pub fn remote_dir(&self) -> PathBuf {
        self.data_dir.join("remote")
    }

    /// Directory of client-only state.
    pub fn local_dir(&self) -> PathBuf {
        self.data_dir.join("local")
    }

    /// Folder of arbitrarily named bulk whitelist files.
    pub fn bulk_dir(&self) -> PathBuf {
        self.remote_dir().join("bulk")
    }

    /// Scratch directory where incoming snapshots are staged before a
    /// refresh merges them over `remote/`.
    pub fn staging_dir(&self) -> PathBuf {
        self.data_dir.join("staging")
    }

    /// One of the named remote set files, e.g. `blacklist.json`.
    pub fn remote_set(&self, name: &str) -> PathBuf {
        self.remote_dir().join(format!("{name}.json"))
    }

    /// The nicknames mapping file.
    pub fn nicknames_file(&self) -> PathBuf {
        self.remote_set("nicknames")
    }

    /// The snapshot version marker.
    pub fn version_file(&self) -> PathBuf {
        self.remote_dir().join("version.json")
    }

    /// The username request-status record.
    pub fn request_statuses_file(&self) -> PathBuf {
        self.local_dir().join("request_statuses.json")
    }
}

/// Remote set files holding plain word arrays (everything except
/// nicknames and the version marker).
pub const REMOTE_SET_NAMES: [&str; 8] = [
    "blacklist",
    "custom",
    "custom_legacy",
    "dictionary",
    "random_prefixes",
    "random_suffixes",
    "trusted_usernames",
    "usernames",
];

/// Client-specific files seeded with empty defaults when absent. The
/// rest of the remote sets ship with the deployment and are required.
pub const CLIENT_SEEDED_SETS: [&str; 5] = [
    "custom",
    "custom_legacy",
    "trusted_usernames",
    "usernames",
    "nicknames",
];

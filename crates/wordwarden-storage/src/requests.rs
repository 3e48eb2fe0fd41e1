//! Write-through store for username whitelist-request profiles.
//!
//! One record per username ever seen, keyed lowercase. Records are
//! never deleted automatically: approved entries accumulate and
//! cleanup is a manual operation. Every mutation rewrites the whole
//! document atomically while holding the map lock, so writes are
//! explicitly serialized and a crash loses at most one increment.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use wordwarden_types::{RequestProfile, RequestStatus, Result, WordwardenError};

use crate::files::{read_json, write_json_atomic};

/// File-backed username → [`RequestProfile`] map.
pub struct RequestStore {
    path: PathBuf,
    profiles: Mutex<HashMap<String, RequestProfile>>,
}

impl RequestStore {
    /// Loads the store from disk.
    ///
    /// The file must exist (datafile initialization seeds an empty
    /// map); a missing or malformed file is fatal at startup.
    pub fn load(path: PathBuf) -> Result<Self> {
        let profiles: HashMap<String, RequestProfile> = read_json(&path)?;
        Ok(Self {
            path,
            profiles: Mutex::new(profiles),
        })
    }

    /// Returns the profile recorded for a username, if any.
    pub fn get(&self, username: &str) -> Option<RequestProfile> {
        self.profiles
            .lock()
            .ok()
            .and_then(|map| map.get(&username.to_lowercase()).cloned())
    }

    /// Inserts or replaces a profile and writes the store through to
    /// disk before returning.
    pub fn put(&self, username: &str, profile: RequestProfile) -> Result<()> {
        let mut map = self.lock()?;
        map.insert(username.to_lowercase(), profile);
        write_json_atomic(&self.path, &*map)
    }

    /// Updates only the status of an existing record (creating a
    /// default record if somehow absent) and writes through.
    ///
    /// Used by the deferred outbound task to record `RequestSent` or
    /// `FailedToRequest` without disturbing the message count.
    pub fn set_status(&self, username: &str, status: RequestStatus) -> Result<()> {
        let mut map = self.lock()?;
        map.entry(username.to_lowercase())
            .or_insert_with(RequestProfile::default)
            .status = status;
        write_json_atomic(&self.path, &*map)
    }

    /// Number of usernames on record.
    pub fn len(&self) -> usize {
        self.profiles.lock().map(|map| map.len()).unwrap_or(0)
    }

    /// Returns `true` if no usernames are on record.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, RequestProfile>>> {
        self.profiles
            .lock()
            .map_err(|_| WordwardenError::StorageError {
                reason: "request store lock poisoned".into(),
            })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

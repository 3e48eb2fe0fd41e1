//! Core shared types for the Wordwarden censorship client.
//!
//! This crate defines all fundamental types used across the workspace.
//! No other crate should define shared types — everything lives here.

pub mod config;

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Dataset
// ---------------------------------------------------------------------------

/// In-memory snapshot of every whitelist/blacklist word set.
///
/// All set members are case-folded to lowercase before storage or
/// comparison. A snapshot is built once at startup from persisted
/// files and replaced wholesale (never mutated field-by-field) when
/// the refresh coordinator pulls a newer version.
#[derive(Clone, Debug, Default)]
pub struct Dataset {
    /// Known bad words. A message containing any of these is refused
    /// outright rather than censored.
    pub blacklist: HashSet<String>,
    /// Words approved through whitelist requests during operation.
    pub custom: HashSet<String>,
    /// Large semi-sorted set of historical words from before the
    /// request system existed. May contain abusable words.
    pub custom_legacy: HashSet<String>,
    /// English dictionary with abusable words and duplicates removed.
    pub dictionary: HashSet<String>,
    /// Username → preferred display alias.
    pub nicknames: HashMap<String, String>,
    /// Lowercased keys ∪ values of `nicknames`, for membership tests.
    pub nicknames_set: HashSet<String>,
    /// First halves of generated temporary usernames.
    pub random_prefixes: HashSet<String>,
    /// Second halves of generated temporary usernames.
    pub random_suffixes: HashSet<String>,
    /// Union of every file in the bulk whitelist folder.
    pub sorted_bulk: HashSet<String>,
    /// Users who interacted with the project before the whitelist
    /// system existed and were never banned.
    pub trusted_usernames: HashSet<String>,
    /// Approved chat usernames and in-game name mentions.
    pub usernames: HashSet<String>,
    /// Monotonic snapshot version, compared during refresh.
    pub version: u64,
}

impl Dataset {
    /// Returns a copy of this snapshot with the overlay's words merged
    /// into the `custom` and `usernames` sets.
    ///
    /// The snapshot itself is never mutated; callers evaluate against
    /// the merged copy until the next full replacement clears the
    /// overlay.
    pub fn with_overlay(&self, overlay: &DatasetOverlay) -> Dataset {
        let mut merged = self.clone();
        merged
            .custom
            .extend(overlay.custom.iter().cloned());
        merged
            .usernames
            .extend(overlay.usernames.iter().cloned());
        merged
    }
}

// ---------------------------------------------------------------------------
// DatasetOverlay
// ---------------------------------------------------------------------------

/// Transient set of server-approved words awaiting the next full
/// dataset reload.
///
/// Push updates accumulate here and are merged into evaluations until
/// a refresh swaps in a snapshot that already contains them, at which
/// point the overlay is cleared.
#[derive(Clone, Debug, Default)]
pub struct DatasetOverlay {
    /// Approved words, lowercased.
    pub custom: HashSet<String>,
    /// Approved usernames, lowercased.
    pub usernames: HashSet<String>,
}

impl DatasetOverlay {
    /// Records one push-approved word, lowercasing it on entry.
    pub fn apply(&mut self, update: &WhitelistUpdate) {
        let word = update.word.to_lowercase();
        if update.is_username {
            self.usernames.insert(word);
        } else {
            self.custom.insert(word);
        }
    }

    /// Returns `true` if no words are pending.
    pub fn is_empty(&self) -> bool {
        self.custom.is_empty() && self.usernames.is_empty()
    }

    /// Discards all pending words (called after a full reload).
    pub fn clear(&mut self) {
        self.custom.clear();
        self.usernames.clear();
    }
}

// ---------------------------------------------------------------------------
// WhitelistUpdate
// ---------------------------------------------------------------------------

/// One unsolicited whitelist approval pushed by the central server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhitelistUpdate {
    /// The approved word or username.
    pub word: String,
    /// Whether the word is a username (routed to the `usernames` set)
    /// rather than a regular word (routed to `custom`).
    pub is_username: bool,
}

// ---------------------------------------------------------------------------
// RequestStatus
// ---------------------------------------------------------------------------

/// Progress of one username through the whitelist-request process.
///
/// `RequestSent` is terminal: once a request has gone out successfully
/// the record is never written again. `FailedToRequest` re-enters the
/// retry branch on the user's next message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    /// Never seen before this call.
    NotOnRecord,
    /// Seen, but below the message threshold for a request.
    NeedsMoreMessages,
    /// Threshold met; an outbound request is due.
    ReadyToRequest,
    /// A request was delivered and acknowledged. Terminal.
    RequestSent,
    /// The last outbound attempt failed; retry on next message.
    FailedToRequest,
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotOnRecord => write!(f, "NOT_ON_RECORD"),
            Self::NeedsMoreMessages => write!(f, "NEEDS_MORE_MESSAGES"),
            Self::ReadyToRequest => write!(f, "READY_TO_REQUEST"),
            Self::RequestSent => write!(f, "REQUEST_SENT"),
            Self::FailedToRequest => write!(f, "FAILED_TO_REQUEST"),
        }
    }
}

// ---------------------------------------------------------------------------
// RequestProfile
// ---------------------------------------------------------------------------

/// Persisted per-username whitelist-request record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestProfile {
    /// Current position in the request process.
    pub status: RequestStatus,
    /// Count of messages received before the first approval.
    pub messages: u32,
}

impl Default for RequestProfile {
    fn default() -> Self {
        Self {
            status: RequestStatus::NotOnRecord,
            messages: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// EvaluateReply
// ---------------------------------------------------------------------------

/// Everything the calling layer needs after one message evaluation.
///
/// - `username`: processed username to display (nickname, temporary
///   alias, or the original name).
/// - `message`: processed message to deliver.
/// - `bot_reply_lines`: notices to relay back to the sender.
/// - `send_users_message`: when `false`, the caller must suppress
///   delivery entirely (blacklist hit).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluateReply {
    pub username: String,
    pub message: String,
    #[serde(default)]
    pub bot_reply_lines: Vec<String>,
    #[serde(default = "default_true")]
    pub send_users_message: bool,
}

fn default_true() -> bool {
    true
}

impl EvaluateReply {
    /// Builds a reply that passes the message through unmodified.
    pub fn passthrough(username: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            message: message.into(),
            bot_reply_lines: Vec::new(),
            send_users_message: true,
        }
    }
}

// ---------------------------------------------------------------------------
// WordwardenError
// ---------------------------------------------------------------------------

/// Central error type for the Wordwarden system.
///
/// All crates in the workspace convert their internal errors into
/// variants of this enum, ensuring a unified error handling surface.
/// Configuration and data errors are fatal at startup; transport and
/// request errors are recovered by the sync supervisor or surfaced as
/// a single failed request.
#[derive(Debug, Error)]
pub enum WordwardenError {
    /// A required setting is missing or invalid.
    #[error("config error: {reason}")]
    ConfigError {
        /// Human-readable description of the configuration problem.
        reason: String,
    },

    /// A core persisted dataset is missing or malformed.
    #[error("data error: {reason}")]
    DataError {
        /// Human-readable description of the dataset problem.
        reason: String,
    },

    /// A file read or write failed during operation.
    #[error("storage error: {reason}")]
    StorageError {
        /// Human-readable description of the storage failure.
        reason: String,
    },

    /// The sync connection dropped, failed to establish, or timed out.
    #[error("transport error: {reason}")]
    TransportError {
        /// Human-readable description of the transport failure.
        reason: String,
    },

    /// An envelope violated the sync protocol (id or sentinel
    /// mismatch, malformed payload).
    #[error("protocol error: {reason}")]
    ProtocolError {
        /// Human-readable description of the protocol violation.
        reason: String,
    },

    /// An outbound whitelist request could not be completed.
    #[error("whitelist request failed: {reason}")]
    RequestFailed {
        /// Human-readable description of the request failure.
        reason: String,
    },
}

/// Convenience result type using [`WordwardenError`].
pub type Result<T> = std::result::Result<T, WordwardenError>;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_status_wire_names() -> std::result::Result<(), Box<dyn std::error::Error>> {
        assert_eq!(
            serde_json::to_string(&RequestStatus::NotOnRecord)?,
            "\"NOT_ON_RECORD\""
        );
        assert_eq!(
            serde_json::to_string(&RequestStatus::NeedsMoreMessages)?,
            "\"NEEDS_MORE_MESSAGES\""
        );
        assert_eq!(
            serde_json::to_string(&RequestStatus::ReadyToRequest)?,
            "\"READY_TO_REQUEST\""
        );
        assert_eq!(
            serde_json::to_string(&RequestStatus::RequestSent)?,
            "\"REQUEST_SENT\""
        );
        assert_eq!(
            serde_json::to_string(&RequestStatus::FailedToRequest)?,
            "\"FAILED_TO_REQUEST\""
        );
        Ok(())
    }

    #[test]
    fn request_profile_roundtrip() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let profile = RequestProfile {
            status: RequestStatus::NeedsMoreMessages,
            messages: 1,
        };
        let json = serde_json::to_string(&profile)?;
        let parsed: RequestProfile = serde_json::from_str(&json)?;
        assert_eq!(profile, parsed);
        Ok(())
    }

    #[test]
    fn request_profile_default_is_unrecorded() {
        let profile = RequestProfile::default();
        assert_eq!(profile.status, RequestStatus::NotOnRecord);
        assert_eq!(profile.messages, 0);
    }

    #[test]
    fn overlay_routes_by_kind() {
        let mut overlay = DatasetOverlay::default();
        overlay.apply(&WhitelistUpdate {
            word: "Hello".into(),
            is_username: false,
        });
        overlay.apply(&WhitelistUpdate {
            word: "SomeUser".into(),
            is_username: true,
        });

        assert!(overlay.custom.contains("hello"));
        assert!(overlay.usernames.contains("someuser"));
        assert!(!overlay.is_empty());

        overlay.clear();
        assert!(overlay.is_empty());
    }

    #[test]
    fn overlay_merge_leaves_snapshot_untouched() {
        let mut snapshot = Dataset::default();
        snapshot.custom.insert("base".into());

        let mut overlay = DatasetOverlay::default();
        overlay.apply(&WhitelistUpdate {
            word: "fresh".into(),
            is_username: false,
        });

        let merged = snapshot.with_overlay(&overlay);
        assert!(merged.custom.contains("base"));
        assert!(merged.custom.contains("fresh"));
        assert!(!snapshot.custom.contains("fresh"));
    }

    #[test]
    fn evaluate_reply_passthrough_defaults() {
        let reply = EvaluateReply::passthrough("user", "hello");
        assert_eq!(reply.username, "user");
        assert_eq!(reply.message, "hello");
        assert!(reply.bot_reply_lines.is_empty());
        assert!(reply.send_users_message);
    }

    #[test]
    fn evaluate_reply_missing_fields_default() -> std::result::Result<(), Box<dyn std::error::Error>>
    {
        let reply: EvaluateReply =
            serde_json::from_str(r#"{"username":"u","message":"m"}"#)?;
        assert!(reply.send_users_message);
        assert!(reply.bot_reply_lines.is_empty());
        Ok(())
    }

    #[test]
    fn error_display_carries_reason() {
        let err = WordwardenError::DataError {
            reason: "blacklist.json malformed".into(),
        };
        assert!(err.to_string().contains("blacklist.json malformed"));
    }
}

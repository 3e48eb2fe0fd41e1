//! Wire format of the sync protocol.
//!
//! JSON envelopes over a persistent duplex connection:
//!
//! - Auth: `{id, function: "AUTH"}` →
//!   `{id, message: "AUTH_SUCCESS" | "AUTH_FAIL"}`.
//! - Request: `{id, timestamp, function: "WHITELIST_REQUEST", data}` →
//!   `{id, timestamp, message: "COMPLETE"}`.
//! - Push: `{id: <serverId>, message: "WHITELIST_UPDATE",
//!   data: {word, is_username}}` with no `timestamp`.

use serde::{Deserialize, Serialize};

/// Reply sentinel: outbound request acknowledged.
pub const COMPLETE: &str = "COMPLETE";
/// Reply sentinel: handshake accepted.
pub const AUTH_SUCCESS: &str = "AUTH_SUCCESS";
/// Reply sentinel: handshake rejected.
pub const AUTH_FAIL: &str = "AUTH_FAIL";
/// Unsolicited push carrying one approved word.
pub const WHITELIST_UPDATE: &str = "WHITELIST_UPDATE";

// ---------------------------------------------------------------------------
// Outbound envelopes
// ---------------------------------------------------------------------------

/// Functions a client may invoke on the server.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WsFunction {
    Auth,
    WhitelistRequest,
}

/// Handshake envelope, sent once per connection.
#[derive(Clone, Debug, Serialize)]
pub struct AuthEnvelope {
    pub id: String,
    pub function: WsFunction,
}

/// One whitelist request with its correlation token.
#[derive(Clone, Debug, Serialize)]
pub struct WhitelistRequestEnvelope {
    pub id: String,
    /// Correlation token; the response echoes it.
    pub timestamp: String,
    pub function: WsFunction,
    pub data: WhitelistRequestData,
}

/// Payload of a whitelist request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WhitelistRequestData {
    /// Words (or the single username) being submitted for approval.
    pub requests: Vec<String>,
    /// The raw message that triggered the request, for reviewer
    /// context.
    pub message: String,
    /// The sender's username.
    pub username: String,
    /// Distinguishes username requests from word requests.
    pub is_username_req: bool,
    /// The chat channel this client filters.
    pub channel_name: String,
}

// ---------------------------------------------------------------------------
// Inbound envelopes
// ---------------------------------------------------------------------------

/// Any envelope received from the server.
///
/// Fields are optional because pushes omit `timestamp` and malformed
/// frames must be classifiable before being discarded.
#[derive(Clone, Debug, Deserialize)]
pub struct InboundEnvelope {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

/// Payload of a whitelist-update push. Strict decoding rejects
/// missing fields and wrong types.
#[derive(Clone, Debug, Deserialize)]
pub struct WhitelistUpdatePayload {
    pub word: String,
    pub is_username: bool,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

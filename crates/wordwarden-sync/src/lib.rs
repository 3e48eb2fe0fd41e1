//! Client for the central whitelist server's sync protocol.
//!
//! A [`SyncClient`](client::SyncClient) holds at most one live
//! WebSocket connection, re-authenticating forever on a fixed backoff
//! whenever the link drops. The receive loop classifies every inbound
//! JSON envelope: unsolicited whitelist-update pushes are validated
//! and forwarded to the orchestrator over a bounded channel, while
//! correlated responses are parked under their token until the waiting
//! request claims them.

pub mod announce;
pub mod client;
pub mod correlation;
pub mod envelope;

pub use announce::announcement_line;
pub use client::{SyncClient, SyncClientConfig};

//! Correlation of asynchronous responses to their requests.
//!
//! Every outbound request carries a fresh time-derived token; any
//! response bearing that token is parked here until the waiting
//! caller claims it. Entries are removed the instant they are
//! claimed, and a response with an unknown token sits unclaimed until
//! the connection is torn down — it can never satisfy a different
//! waiter.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::Notify;
use wordwarden_types::{Result, WordwardenError};

use crate::envelope::InboundEnvelope;

/// Process-wide tiebreaker appended to each token so two requests in
/// the same nanosecond still get distinct tokens.
static TOKEN_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Generates a fresh correlation token.
///
/// Callers generate the token only after their liveness wait so a
/// response can never predate its request.
pub fn next_token() -> String {
    let nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let seq = TOKEN_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("msg_{nanos}_{seq}")
}

// ---------------------------------------------------------------------------
// CorrelationMap
// ---------------------------------------------------------------------------

/// Token → response map with claim notification.
#[derive(Default)]
pub struct CorrelationMap {
    pending: Mutex<HashMap<String, InboundEnvelope>>,
    arrived: Notify,
}

impl CorrelationMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parks a response under its token and wakes all waiters.
    pub fn deliver(&self, token: String, envelope: InboundEnvelope) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.insert(token, envelope);
        }
        self.arrived.notify_waiters();
    }

    /// Claims the response for a token, removing it.
    pub fn try_claim(&self, token: &str) -> Option<InboundEnvelope> {
        self.pending
            .lock()
            .ok()
            .and_then(|mut pending| pending.remove(token))
    }

    /// Waits for the response to a token.
    ///
    /// Wakes on every delivery, re-checking up to `max_attempts`
    /// times with `poll_interval` as the per-attempt ceiling — the
    /// overall timeout budget is `max_attempts × poll_interval`.
    pub async fn wait(
        &self,
        token: &str,
        poll_interval: Duration,
        max_attempts: u32,
    ) -> Result<InboundEnvelope> {
        let mut attempts = 0u32;
        loop {
            if let Some(envelope) = self.try_claim(token) {
                return Ok(envelope);
            }

            attempts += 1;
            if attempts > max_attempts {
                return Err(WordwardenError::RequestFailed {
                    reason: format!("timed out waiting for response {token}"),
                });
            }

            let _ = tokio::time::timeout(poll_interval, self.arrived.notified()).await;
        }
    }

    /// Number of unclaimed responses (stale entries from requests
    /// that timed out before their response arrived).
    pub fn unclaimed(&self) -> usize {
        self.pending.lock().map(|pending| pending.len()).unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(message: &str) -> InboundEnvelope {
        serde_json::from_str(&format!(r#"{{"message":"{message}"}}"#)).expect("valid")
    }

    #[test]
    fn tokens_are_unique_and_time_derived() {
        let first = next_token();
        let second = next_token();
        assert_ne!(first, second);
        assert!(first.starts_with("msg_"));
    }

    #[tokio::test]
    async fn delivered_response_is_claimed_once() {
        let map = CorrelationMap::new();
        map.deliver("msg_1".into(), envelope("COMPLETE"));

        assert!(map.try_claim("msg_1").is_some());
        assert!(map.try_claim("msg_1").is_none());
    }

    #[tokio::test]
    async fn mismatched_token_is_never_claimed() {
        let map = CorrelationMap::new();
        map.deliver("msg_other".into(), envelope("COMPLETE"));

        let result = map
            .wait("msg_mine", Duration::from_millis(5), 3)
            .await;
        assert!(result.is_err());
        // The stray response is still parked, untouched.
        assert_eq!(map.unclaimed(), 1);
    }

    #[tokio::test]
    async fn wait_returns_response_delivered_later() {
        let map = std::sync::Arc::new(CorrelationMap::new());

        let delivering = std::sync::Arc::clone(&map);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            delivering.deliver("msg_42".into(), envelope("COMPLETE"));
        });

        let response = map
            .wait("msg_42", Duration::from_millis(50), 10)
            .await
            .expect("delivered");
        assert_eq!(response.message.as_deref(), Some("COMPLETE"));
        handle.await.expect("join");
    }

    #[tokio::test]
    async fn wait_times_out_after_attempt_budget() {
        let map = CorrelationMap::new();
        let started = std::time::Instant::now();

        let result = map
            .wait("msg_never", Duration::from_millis(5), 4)
            .await;
        assert!(result.is_err());
        // Four attempt windows must actually elapse.
        assert!(started.elapsed() >= Duration::from_millis(20));
    }

    #[tokio::test]
    async fn concurrent_waiters_each_get_their_own_response() {
        let map = std::sync::Arc::new(CorrelationMap::new());

        let map_a = std::sync::Arc::clone(&map);
        let waiter_a = tokio::spawn(async move {
            map_a
                .wait("msg_a", Duration::from_millis(50), 10)
                .await
        });
        let map_b = std::sync::Arc::clone(&map);
        let waiter_b = tokio::spawn(async move {
            map_b
                .wait("msg_b", Duration::from_millis(50), 10)
                .await
        });

        tokio::time::sleep(Duration::from_millis(5)).await;
        map.deliver("msg_b".into(), envelope("B"));
        map.deliver("msg_a".into(), envelope("A"));

        let a = waiter_a.await.expect("join").expect("resolved");
        let b = waiter_b.await.expect("join").expect("resolved");
        assert_eq!(a.message.as_deref(), Some("A"));
        assert_eq!(b.message.as_deref(), Some("B"));
    }
}

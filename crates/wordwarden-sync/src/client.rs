//! Session-oriented sync client.
//!
//! One [`SyncClient`] holds at most one live connection. A supervisor
//! loop re-attempts the handshake whenever the link is down, sleeping
//! a fixed backoff between attempts — unbounded retries, no jitter.
//! The serve loop multiplexes inbound frames, queued outbound frames,
//! and the shutdown signal with `tokio::select!`.

use std::sync::Mutex;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use wordwarden_types::config::AppConfig;
use wordwarden_types::{Result, WhitelistUpdate, WordwardenError};

use crate::announce::announcement_line;
use crate::correlation::{self, CorrelationMap};
use crate::envelope::{
    AuthEnvelope, InboundEnvelope, WhitelistRequestData, WhitelistRequestEnvelope,
    WhitelistUpdatePayload, WsFunction, AUTH_SUCCESS, COMPLETE, WHITELIST_UPDATE,
};

// ---------------------------------------------------------------------------
// SyncClientConfig
// ---------------------------------------------------------------------------

/// Connection and timing parameters for the sync client.
#[derive(Clone, Debug)]
pub struct SyncClientConfig {
    /// WebSocket URL of the central server.
    pub server_url: String,
    /// Identity echoed during AUTH and on correlated responses.
    pub client_id: String,
    /// Identity the server must present on pushes.
    pub server_id: String,
    /// Channel context forwarded with every request.
    pub channel_name: String,
    /// Backoff between reconnect attempts; also the liveness poll
    /// interval.
    pub reconnect_interval: Duration,
    /// Interval between checks for a correlated response.
    pub response_poll_interval: Duration,
    /// Response checks before a request times out.
    pub response_poll_attempts: u32,
    /// Liveness polls granted to a username request (0 = unbounded).
    pub username_live_attempts: u32,
}

impl SyncClientConfig {
    /// Extracts the sync-relevant slice of the application config.
    pub fn from_app(config: &AppConfig) -> Self {
        Self {
            server_url: config.server_url.clone(),
            client_id: config.client_id.clone(),
            server_id: config.server_id.clone(),
            channel_name: config.channel_name.clone(),
            reconnect_interval: Duration::from_secs(config.reconnect_interval_secs),
            response_poll_interval: Duration::from_secs(config.response_poll_interval_secs),
            response_poll_attempts: config.response_poll_attempts,
            username_live_attempts: config.username_live_attempts,
        }
    }
}

// ---------------------------------------------------------------------------
// SyncClient
// ---------------------------------------------------------------------------

/// Long-lived client for the central whitelist server.
pub struct SyncClient {
    config: SyncClientConfig,
    correlation: CorrelationMap,
    live_tx: watch::Sender<bool>,
    outbound: Mutex<Option<mpsc::UnboundedSender<String>>>,
    update_tx: mpsc::Sender<WhitelistUpdate>,
    announce_tx: mpsc::Sender<String>,
}

impl SyncClient {
    /// Creates a client. Approved pushes go to `update_tx`; formatted
    /// announcements go to `announce_tx`.
    pub fn new(
        config: SyncClientConfig,
        update_tx: mpsc::Sender<WhitelistUpdate>,
        announce_tx: mpsc::Sender<String>,
    ) -> Self {
        let (live_tx, _) = watch::channel(false);
        Self {
            config,
            correlation: CorrelationMap::new(),
            live_tx,
            outbound: Mutex::new(None),
            update_tx,
            announce_tx,
        }
    }

    /// Returns `true` while an authenticated connection is up.
    pub fn is_live(&self) -> bool {
        *self.live_tx.borrow()
    }

    // -----------------------------------------------------------------------
    // Supervisor
    // -----------------------------------------------------------------------

    /// Runs the connect-and-receive loop until shutdown.
    ///
    /// Spawned once as a dedicated task for the lifetime of the
    /// process. Connection failures are logged and retried after the
    /// fixed backoff; they are never fatal.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(url = %self.config.server_url, "sync supervisor started");

        loop {
            if *shutdown.borrow() {
                break;
            }

            match self.connect_and_serve(&mut shutdown).await {
                Ok(()) => tracing::info!("sync connection closed"),
                Err(e) => tracing::warn!(%e, "sync connection failed"),
            }

            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                _ = tokio::time::sleep(self.config.reconnect_interval) => {}
                _ = shutdown.changed() => {}
            }
        }

        tracing::info!("sync supervisor stopped");
    }

    /// One connection lifecycle: connect, authenticate, serve, tear
    /// down. Liveness is only set after a successful handshake and is
    /// always cleared on exit.
    async fn connect_and_serve(&self, shutdown: &mut watch::Receiver<bool>) -> Result<()> {
        let (stream, _) = connect_async(self.config.server_url.as_str())
            .await
            .map_err(|e| WordwardenError::TransportError {
                reason: format!("failed to connect to {}: {e}", self.config.server_url),
            })?;
        let (mut sink, mut stream) = stream.split();

        // AUTH handshake. Any mismatch invalidates the connection.
        let auth = serde_json::to_string(&AuthEnvelope {
            id: self.config.client_id.clone(),
            function: WsFunction::Auth,
        })
        .map_err(|e| WordwardenError::ProtocolError {
            reason: format!("failed to encode auth envelope: {e}"),
        })?;

        sink.send(Message::Text(auth))
            .await
            .map_err(|e| WordwardenError::TransportError {
                reason: format!("failed to send auth envelope: {e}"),
            })?;

        let first = match stream.next().await {
            Some(Ok(msg)) => msg,
            Some(Err(e)) => {
                return Err(WordwardenError::TransportError {
                    reason: format!("receive failed during handshake: {e}"),
                })
            }
            None => {
                return Err(WordwardenError::TransportError {
                    reason: "connection closed during handshake".into(),
                })
            }
        };

        let text = first
            .into_text()
            .map_err(|e| WordwardenError::ProtocolError {
                reason: format!("non-text handshake reply: {e}"),
            })?;
        let reply: InboundEnvelope =
            serde_json::from_str(&text).map_err(|e| WordwardenError::ProtocolError {
                reason: format!("undecodable handshake reply: {e}"),
            })?;

        if reply.id.as_deref() != Some(self.config.client_id.as_str()) {
            return Err(WordwardenError::ProtocolError {
                reason: format!(
                    "handshake client id mismatch (found {:?}, expected {})",
                    reply.id, self.config.client_id
                ),
            });
        }
        if reply.message.as_deref() != Some(AUTH_SUCCESS) {
            return Err(WordwardenError::ProtocolError {
                reason: format!(
                    "handshake rejected (found {:?}, expected {AUTH_SUCCESS})",
                    reply.message
                ),
            });
        }

        // Live. Install the writer and serve until the link drops.
        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<String>();
        self.install_writer(Some(outbound_tx));
        self.live_tx.send_replace(true);
        tracing::info!("sync link live");

        let result = loop {
            tokio::select! {
                inbound = stream.next() => match inbound {
                    Some(Ok(msg)) => {
                        if msg.is_text() {
                            match msg.into_text() {
                                Ok(text) => self.dispatch_inbound(&text).await,
                                Err(e) => {
                                    tracing::warn!(%e, "non-UTF-8 sync frame discarded");
                                }
                            }
                        } else if msg.is_close() {
                            break Ok(());
                        }
                    }
                    Some(Err(e)) => break Err(WordwardenError::TransportError {
                        reason: format!("sync receive failed: {e}"),
                    }),
                    None => break Ok(()),
                },
                outbound = outbound_rx.recv() => match outbound {
                    Some(frame) => {
                        if let Err(e) = sink.send(Message::Text(frame)).await {
                            break Err(WordwardenError::TransportError {
                                reason: format!("sync send failed: {e}"),
                            });
                        }
                    }
                    None => break Ok(()),
                },
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        let _ = sink.send(Message::Close(None)).await;
                        break Ok(());
                    }
                }
            }
        };

        self.live_tx.send_replace(false);
        self.install_writer(None);
        result
    }

    fn install_writer(&self, writer: Option<mpsc::UnboundedSender<String>>) {
        if let Ok(mut outbound) = self.outbound.lock() {
            *outbound = writer;
        }
    }

    // -----------------------------------------------------------------------
    // Inbound classification
    // -----------------------------------------------------------------------

    /// Classifies one inbound frame: push, correlated response, or
    /// noise. Malformed frames are logged and discarded — the
    /// connection stays up.
    async fn dispatch_inbound(&self, raw: &str) {
        let envelope: InboundEnvelope = match serde_json::from_str(raw) {
            Ok(env) => env,
            Err(e) => {
                tracing::warn!(%e, "undecodable sync frame discarded");
                return;
            }
        };

        if envelope.message.as_deref() == Some(WHITELIST_UPDATE) {
            if let Err(e) = self.apply_push(envelope).await {
                tracing::warn!(%e, "whitelist push discarded");
            }
            return;
        }

        match envelope.timestamp.clone() {
            Some(token) => self.correlation.deliver(token, envelope),
            None => tracing::warn!("sync frame without correlation token discarded"),
        }
    }

    /// Validates and forwards one unsolicited whitelist update.
    async fn apply_push(&self, envelope: InboundEnvelope) -> Result<()> {
        if envelope.id.as_deref() != Some(self.config.server_id.as_str()) {
            return Err(WordwardenError::ProtocolError {
                reason: format!(
                    "push server id mismatch (found {:?}, expected {})",
                    envelope.id, self.config.server_id
                ),
            });
        }

        let data = envelope.data.ok_or_else(|| WordwardenError::ProtocolError {
            reason: "push payload missing".into(),
        })?;
        let payload: WhitelistUpdatePayload =
            serde_json::from_value(data).map_err(|e| WordwardenError::ProtocolError {
                reason: format!("push payload malformed: {e}"),
            })?;

        let update = WhitelistUpdate {
            word: payload.word,
            is_username: payload.is_username,
        };
        tracing::info!(
            word = %update.word,
            is_username = update.is_username,
            "whitelist update received"
        );

        let line = announcement_line(&update.word, update.is_username);

        if let Err(e) = self.update_tx.send(update).await {
            tracing::error!(%e, "update channel closed, push dropped");
        }

        // Announcement delivery is best-effort; failures never
        // propagate to the connection.
        if let Err(e) = self.announce_tx.send(line).await {
            tracing::warn!(%e, "announcement channel closed");
        }

        Ok(())
    }

    // -----------------------------------------------------------------------
    // Outbound requests
    // -----------------------------------------------------------------------

    /// Submits words (or one username) for whitelisting and waits for
    /// the server's acknowledgement.
    ///
    /// Word requests wait for liveness without bound; username
    /// requests give up after the configured attempt budget so the
    /// caller can record the failure. Any id/sentinel mismatch or
    /// timeout is an error the caller maps to `FailedToRequest`.
    pub async fn whitelist_request(
        &self,
        requests: &[String],
        message: &str,
        username: &str,
        is_username_req: bool,
    ) -> Result<()> {
        let max_attempts = if is_username_req {
            self.config.username_live_attempts
        } else {
            0
        };
        if !self.wait_until_live(max_attempts).await {
            return Err(WordwardenError::TransportError {
                reason: "timed out waiting for the sync link to go live".into(),
            });
        }

        // The token is generated only after the wait, so a response
        // can never predate its request; tokens are never reused.
        let token = correlation::next_token();
        let envelope = WhitelistRequestEnvelope {
            id: self.config.client_id.clone(),
            timestamp: token.clone(),
            function: WsFunction::WhitelistRequest,
            data: WhitelistRequestData {
                requests: requests.to_vec(),
                message: message.to_string(),
                username: username.to_string(),
                is_username_req,
                channel_name: self.config.channel_name.clone(),
            },
        };
        let frame =
            serde_json::to_string(&envelope).map_err(|e| WordwardenError::ProtocolError {
                reason: format!("failed to encode whitelist request: {e}"),
            })?;
        self.send_frame(frame)?;

        tracing::debug!(
            token = %token,
            words = requests.len(),
            is_username_req,
            "whitelist request sent"
        );

        let response = self
            .correlation
            .wait(
                &token,
                self.config.response_poll_interval,
                self.config.response_poll_attempts,
            )
            .await?;

        if response.id.as_deref() != Some(self.config.client_id.as_str()) {
            return Err(WordwardenError::ProtocolError {
                reason: format!(
                    "response client id mismatch (found {:?}, expected {})",
                    response.id, self.config.client_id
                ),
            });
        }
        if response.message.as_deref() != Some(COMPLETE) {
            return Err(WordwardenError::ProtocolError {
                reason: format!(
                    "unexpected response message (found {:?}, expected {COMPLETE})",
                    response.message
                ),
            });
        }

        Ok(())
    }

    /// Queues one frame on the current connection's writer.
    fn send_frame(&self, frame: String) -> Result<()> {
        let outbound = self
            .outbound
            .lock()
            .map_err(|_| WordwardenError::TransportError {
                reason: "outbound writer lock poisoned".into(),
            })?;

        match outbound.as_ref() {
            Some(writer) => writer
                .send(frame)
                .map_err(|_| WordwardenError::TransportError {
                    reason: "sync link dropped before send".into(),
                }),
            None => Err(WordwardenError::TransportError {
                reason: "sync link not live".into(),
            }),
        }
    }

    /// Waits until the link is live.
    ///
    /// With `max_attempts == 0` the wait is unbounded. Otherwise each
    /// reconnect-interval window that passes without liveness counts
    /// as one attempt, and the wait gives up once the budget is
    /// exhausted.
    async fn wait_until_live(&self, max_attempts: u32) -> bool {
        let mut live_rx = self.live_tx.subscribe();
        let mut attempts = 0u32;
        loop {
            if *live_rx.borrow() {
                return true;
            }

            attempts += 1;
            if max_attempts > 0 && attempts > max_attempts {
                return false;
            }

            let _ = tokio::time::timeout(
                self.config.reconnect_interval,
                live_rx.changed(),
            )
            .await;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! The orchestrator node.
//!
//! [`CensorNode`] composes the engine, the storage layer, and the
//! sync client behind one `evaluate` entry point. Evaluation order:
//!
//! 1. Drain pending push updates into the overlay; merge the overlay
//!    into a working snapshot.
//! 2. Nickname lookup; trusted users bypass everything else.
//! 3. Resolve the username: unlisted names get a deterministic
//!    temporary alias and advance the request state machine.
//! 4. Blacklist gate: any hit suppresses delivery outright.
//! 5. Censor the message; rejected words go out as a deferred
//!    whitelist request.
//!
//! Evaluations never block on network I/O: outbound requests run as
//! spawned tasks after the reply is returned, and their outcome is
//! written through the request store.

use std::sync::{Arc, Mutex, RwLock};

use tokio::sync::mpsc;
use wordwarden_engine as engine;
use wordwarden_storage::RequestStore;
use wordwarden_types::config::AppConfig;
use wordwarden_types::{
    Dataset, DatasetOverlay, EvaluateReply, RequestStatus, WhitelistUpdate,
};

use crate::outbound::WhitelistRequester;
use crate::requests;

/// Composition point for message evaluation.
pub struct CensorNode {
    config: AppConfig,
    /// Current dataset snapshot. Read-shared by evaluations, replaced
    /// wholesale by the refresh coordinator.
    dataset: RwLock<Arc<Dataset>>,
    /// Push-approved words awaiting the next full reload.
    overlay: Mutex<DatasetOverlay>,
    /// Push updates from the sync client, drained at evaluation time.
    update_rx: Mutex<mpsc::Receiver<WhitelistUpdate>>,
    requests: Arc<RequestStore>,
    requester: Arc<dyn WhitelistRequester>,
}

impl CensorNode {
    /// Assembles a node from loaded state.
    pub fn new(
        config: AppConfig,
        dataset: Dataset,
        requests: Arc<RequestStore>,
        requester: Arc<dyn WhitelistRequester>,
        update_rx: mpsc::Receiver<WhitelistUpdate>,
    ) -> Self {
        Self {
            config,
            dataset: RwLock::new(Arc::new(dataset)),
            overlay: Mutex::new(DatasetOverlay::default()),
            update_rx: Mutex::new(update_rx),
            requests,
            requester,
        }
    }

    /// The node's configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Version of the current snapshot.
    pub fn dataset_version(&self) -> u64 {
        self.snapshot().version
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Arc<Dataset> {
        self.dataset
            .read()
            .map(|guard| Arc::clone(&guard))
            .unwrap_or_default()
    }

    /// Swaps in a freshly loaded snapshot and clears the overlay —
    /// approved words are assumed present in the new data.
    pub fn install_dataset(&self, dataset: Dataset) {
        let version = dataset.version;
        if let Ok(mut guard) = self.dataset.write() {
            *guard = Arc::new(dataset);
        }
        if let Ok(mut overlay) = self.overlay.lock() {
            overlay.clear();
        }
        tracing::info!(version, "dataset snapshot installed, overlay cleared");
    }

    // -----------------------------------------------------------------------
    // Evaluation
    // -----------------------------------------------------------------------

    /// Evaluates one inbound chat message.
    ///
    /// Always returns a reply; network trouble degrades to "assign
    /// temp name, approval pending" rather than blocking the message.
    pub fn evaluate(&self, username: &str, message: &str) -> EvaluateReply {
        self.absorb_updates();
        let ds = self.working_dataset();

        let nickname = engine::user_nickname(&ds, username);

        // Trusted users skip the censor system entirely (the nickname
        // still applies).
        if engine::user_is_trusted(&ds, username) {
            return EvaluateReply::passthrough(
                nickname.unwrap_or_else(|| username.to_string()),
                message,
            );
        }

        let mut reply_lines: Vec<String> = Vec::new();
        let mut display_name = nickname
            .clone()
            .unwrap_or_else(|| username.to_string());

        if nickname.is_none() && !engine::username_in_whitelist(&ds, username) {
            // Unsafe name: assign the deterministic alias and move
            // the approval process along.
            let alias = engine::temp_username(&ds, username)
                .unwrap_or_else(|| username.to_string());
            display_name = alias.clone();

            let reported = self.progress_username_request(username, message);
            if reported == RequestStatus::NotOnRecord {
                reply_lines.push(format!(
                    "[Assigning random username '{alias}'. Your real username \
                     '{username}' is pending approval.]"
                ));
            }
        }

        let blacklisted = engine::blacklisted_words(&ds, message);
        if !blacklisted.is_empty() {
            tracing::warn!(
                username,
                words = %blacklisted.join(", "),
                "blacklisted words in message, delivery suppressed"
            );
            reply_lines.push(format!(
                "[You've attempted to send a message with blacklisted words ({}).]",
                blacklisted.join(", ")
            ));
            return EvaluateReply {
                username: display_name,
                message: message.to_string(),
                bot_reply_lines: reply_lines,
                send_users_message: false,
            };
        }

        let outcome = engine::censor(&ds, message);
        if !outcome.rejected.is_empty() {
            reply_lines.push(format!(
                "[Some words you used are not in the whitelist for new users \
                 and have been sent for approval ({})]",
                outcome.rejected.join(", ")
            ));
            self.spawn_word_request(outcome.rejected.clone(), message, username);
        }

        EvaluateReply {
            username: display_name,
            message: outcome.censored,
            bot_reply_lines: reply_lines,
            send_users_message: true,
        }
    }

    /// Moves queued push updates into the overlay.
    fn absorb_updates(&self) {
        let mut update_rx = match self.update_rx.lock() {
            Ok(guard) => guard,
            Err(_) => return,
        };
        let mut overlay = match self.overlay.lock() {
            Ok(guard) => guard,
            Err(_) => return,
        };

        while let Ok(update) = update_rx.try_recv() {
            tracing::info!(
                word = %update.word,
                is_username = update.is_username,
                "merging push-approved word into overlay"
            );
            overlay.apply(&update);
        }
    }

    /// The snapshot with any overlay words merged in.
    fn working_dataset(&self) -> Arc<Dataset> {
        let snapshot = self.snapshot();
        let overlay = match self.overlay.lock() {
            Ok(guard) => guard,
            Err(_) => return snapshot,
        };
        if overlay.is_empty() {
            snapshot
        } else {
            Arc::new(snapshot.with_overlay(&overlay))
        }
    }

    // -----------------------------------------------------------------------
    // Whitelist-request progression
    // -----------------------------------------------------------------------

    /// Advances the username's record, persists the mutation, and
    /// schedules the outbound attempt when one is due.
    fn progress_username_request(&self, username: &str, message: &str) -> RequestStatus {
        let key = username.to_lowercase();
        let current = self.requests.get(&key);
        let outcome = requests::advance(
            current.as_ref(),
            self.config.request_message_threshold,
        );

        if outcome.mutated {
            if let Err(e) = self.requests.put(&key, outcome.profile.clone()) {
                tracing::error!(%e, username = %key, "failed to persist request record");
            }
        }

        if outcome.request_due {
            self.spawn_username_request(key, message.to_string());
        }

        outcome.reported
    }

    /// Deferred outbound username request. Runs after the evaluation
    /// reply is returned; its outcome is written through the store so
    /// a failure downgrades to `FailedToRequest` rather than leaving
    /// the record in `ReadyToRequest` silently.
    fn spawn_username_request(&self, username: String, message: String) {
        let requester = Arc::clone(&self.requester);
        let store = Arc::clone(&self.requests);

        tokio::spawn(async move {
            let result = requester
                .request_whitelist(
                    vec![username.clone()],
                    message,
                    username.clone(),
                    true,
                )
                .await;

            let status = match result {
                Ok(()) => RequestStatus::RequestSent,
                Err(e) => {
                    tracing::warn!(%e, username = %username, "username whitelist request failed");
                    RequestStatus::FailedToRequest
                }
            };

            if let Err(e) = store.set_status(&username, status) {
                tracing::error!(%e, username = %username, "failed to persist request outcome");
            } else {
                tracing::info!(username = %username, %status, "username request resolved");
            }
        });
    }

    /// Deferred outbound word request. Failures are logged only — the
    /// words will simply be rejected again next time.
    fn spawn_word_request(&self, words: Vec<String>, message: &str, username: &str) {
        let requester = Arc::clone(&self.requester);
        let message = message.to_string();
        let username = username.to_string();

        tokio::spawn(async move {
            let count = words.len();
            match requester
                .request_whitelist(words, message, username, false)
                .await
            {
                Ok(()) => tracing::info!(words = count, "word whitelist request acknowledged"),
                Err(e) => tracing::warn!(%e, "word whitelist request failed"),
            }
        });
    }
}

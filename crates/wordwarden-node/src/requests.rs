//! Whitelist-request state machine.
//!
//! Each message from an unverified user advances their record one
//! step:
//!
//! | Current | Condition | Next |
//! |---|---|---|
//! | `RequestSent` | any | `RequestSent` (no write) |
//! | `NotOnRecord` | first sighting | `NeedsMoreMessages` (1) |
//! | `NeedsMoreMessages` | below threshold | `NeedsMoreMessages` (+1) |
//! | `NeedsMoreMessages` | threshold met | `ReadyToRequest` (+1) |
//! | `ReadyToRequest` / `FailedToRequest` | — | unchanged; request due |
//!
//! The transition is pure; the caller persists every mutation
//! write-through and schedules the outbound attempt when one is due.
//! The attempt's outcome — `RequestSent` or `FailedToRequest` — is
//! written by the deferred task, not here.

use wordwarden_types::{RequestProfile, RequestStatus};

/// Result of advancing one username's record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Advance {
    /// The record after the transition.
    pub profile: RequestProfile,
    /// Status to report to the orchestrator. On the call that creates
    /// the record this is `NotOnRecord` even though the persisted
    /// status is already `NeedsMoreMessages` — the asymmetry lets the
    /// caller show the pending-approval notice exactly once.
    pub reported: RequestStatus,
    /// Whether the record changed and must be persisted.
    pub mutated: bool,
    /// Whether an outbound whitelist request should be scheduled.
    pub request_due: bool,
}

/// Advances a username's record by one received message.
pub fn advance(current: Option<&RequestProfile>, threshold: u32) -> Advance {
    let current = current.cloned().unwrap_or_default();

    match current.status {
        // Terminal: the request went out; never write again.
        RequestStatus::RequestSent => Advance {
            profile: current,
            reported: RequestStatus::RequestSent,
            mutated: false,
            request_due: false,
        },

        RequestStatus::NotOnRecord => Advance {
            profile: RequestProfile {
                status: RequestStatus::NeedsMoreMessages,
                messages: 1,
            },
            reported: RequestStatus::NotOnRecord,
            mutated: true,
            request_due: false,
        },

        RequestStatus::NeedsMoreMessages => {
            let messages = current.messages + 1;
            let status = if messages >= threshold {
                RequestStatus::ReadyToRequest
            } else {
                RequestStatus::NeedsMoreMessages
            };
            Advance {
                profile: RequestProfile { status, messages },
                reported: status,
                mutated: true,
                request_due: status == RequestStatus::ReadyToRequest,
            }
        }

        // Waiting on (or retrying) the outbound attempt; the record
        // itself does not change here.
        RequestStatus::ReadyToRequest | RequestStatus::FailedToRequest => Advance {
            reported: current.status,
            profile: current,
            mutated: false,
            request_due: true,
        },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

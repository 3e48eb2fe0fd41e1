//! Orchestrator node for the Wordwarden censorship client.
//!
//! [`CensorNode`](node::CensorNode) is the composition point: it owns
//! the shared dataset snapshot, the push overlay, and the request
//! store, and drives every message evaluation through the engine,
//! the whitelist-request state machine, and the deferred outbound
//! request tasks. The dataset refresh coordinator lives here too.

pub mod node;
pub mod outbound;
pub mod refresh;
pub mod requests;

pub use node::CensorNode;
pub use outbound::WhitelistRequester;
pub use refresh::{refresh_from_staging, run_refresh_task, RefreshOutcome};

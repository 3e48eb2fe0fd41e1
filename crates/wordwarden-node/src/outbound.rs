//! Seam between the orchestrator and the sync transport.
//!
//! Deferred request tasks hold a `dyn WhitelistRequester`, which lets
//! evaluation flow be exercised without a live server connection.

use futures::future::BoxFuture;
use wordwarden_sync::SyncClient;
use wordwarden_types::Result;

/// Something that can submit a whitelist request and report whether
/// the central server acknowledged it.
pub trait WhitelistRequester: Send + Sync + 'static {
    /// Submits `requests` (words, or the single username) for
    /// approval. An error means the caller must record the attempt as
    /// failed — including on timeout.
    fn request_whitelist(
        &self,
        requests: Vec<String>,
        message: String,
        username: String,
        is_username_req: bool,
    ) -> BoxFuture<'_, Result<()>>;
}

impl WhitelistRequester for SyncClient {
    fn request_whitelist(
        &self,
        requests: Vec<String>,
        message: String,
        username: String,
        is_username_req: bool,
    ) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            self.whitelist_request(&requests, &message, &username, is_username_req)
                .await
        })
    }
}

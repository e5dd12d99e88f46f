use crate::provider::{CallRegistrar, ResponseStore, ResponseUpdate};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Best-effort cleanup for a page closing mid-call.
///
/// Fires exactly one "mark ended" and one "fetch transcript" request without
/// awaiting either; delivery survives page teardown only as far as the
/// runtime allows. This path replaces the orderly finalizer entirely, it
/// never runs alongside it.
pub(crate) struct UnloadHandler {
    store: Arc<dyn ResponseStore>,
    registrar: Arc<dyn CallRegistrar>,
}

impl UnloadHandler {
    pub(crate) fn new(store: Arc<dyn ResponseStore>, registrar: Arc<dyn CallRegistrar>) -> Self {
        Self { store, registrar }
    }

    /// Issue both requests and return immediately. The handles are returned
    /// so a caller that does outlive the page can still observe completion.
    pub(crate) fn fire(&self, update: ResponseUpdate) -> (JoinHandle<()>, JoinHandle<()>) {
        let call_id = update.call_id.clone();
        info!("Unload cleanup for call {}", call_id);

        let store = Arc::clone(&self.store);
        let mark_ended = tokio::spawn(async move {
            if let Err(e) = store.upsert_response(&update).await {
                warn!("Unload mark-ended request failed: {}", e);
            }
        });

        let registrar = Arc::clone(&self.registrar);
        let fetch_transcript = tokio::spawn(async move {
            if let Err(e) = registrar.retrieve_call(&call_id).await {
                warn!("Unload transcript request failed: {}", e);
            }
        });

        (mark_ended, fetch_transcript)
    }
}

use crate::provider::{CallRegistrar, ResponseStore};
use crate::session::SessionController;
use crate::transport::{PermissionProbe, TransportFactory};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

/// How long an ended call stays queryable (status, feedback) after its
/// background work has finished, before the entry is dropped.
pub const ENDED_RETENTION: Duration = Duration::from_secs(300);

/// Injected collaborators shared by every call the server hosts.
pub struct RuntimeDeps {
    pub transport_factory: Arc<dyn TransportFactory>,
    pub registrar: Arc<dyn CallRegistrar>,
    pub store: Arc<dyn ResponseStore>,
    pub permissions: Arc<dyn PermissionProbe>,
}

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Live and recently ended calls (call_id -> controller). Entries are
    /// retained after the call ends so status stays queryable while the
    /// slow finalization phase runs, then evicted after [`ENDED_RETENTION`].
    pub calls: Arc<RwLock<HashMap<String, Arc<SessionController>>>>,
    pub deps: Arc<RuntimeDeps>,
}

impl AppState {
    pub fn new(deps: RuntimeDeps) -> Self {
        Self {
            calls: Arc::new(RwLock::new(HashMap::new())),
            deps: Arc::new(deps),
        }
    }

    /// Track a live call. A background task waits for the call's work to
    /// finish, keeps the entry around for the retention window, then removes
    /// it so the map does not grow with server uptime.
    pub async fn insert_call(&self, call_id: String, controller: Arc<SessionController>) {
        self.calls
            .write()
            .await
            .insert(call_id.clone(), Arc::clone(&controller));

        let calls = Arc::clone(&self.calls);
        tokio::spawn(async move {
            controller.join().await;
            tokio::time::sleep(ENDED_RETENTION).await;
            calls.write().await.remove(&call_id);
            debug!("Evicted ended call {} from the call map", call_id);
        });
    }
}

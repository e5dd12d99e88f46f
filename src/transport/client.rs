use super::events::TransportEvent;
use crate::error::TransportError;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;

/// A live audio/transcript connection for a single call.
///
/// `start_call` hands back the event receiver for this call; dropping the
/// receiver detaches the listener side. `stop_call` must be idempotent:
/// the unload path and the normal end path may both reach for it.
#[async_trait]
pub trait TransportClient: Send + Sync {
    /// Open the connection using the provider-issued access token and start
    /// streaming events. Fails without side effects if the connection cannot
    /// be established.
    async fn start_call(
        &self,
        access_token: &str,
    ) -> Result<mpsc::Receiver<TransportEvent>, TransportError>;

    /// Tear the connection down locally. Safe to call at any time, including
    /// after the remote side already ended the call.
    async fn stop_call(&self);
}

/// Creates one transport client per call, so no connection state is ever
/// shared between calls.
pub trait TransportFactory: Send + Sync {
    fn new_client(&self) -> Arc<dyn TransportClient>;
}

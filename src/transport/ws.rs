use super::client::{TransportClient, TransportFactory};
use super::events::{TranscriptTurn, TransportEvent};
use crate::error::TransportError;
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{info, warn};

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Provider event frame as it appears on the wire.
#[derive(Debug, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
enum WireEvent {
    CallStarted,
    CallEnded,
    AgentStartTalking,
    AgentStopTalking,
    Update { transcript: Vec<TranscriptTurn> },
    Error { message: String },
}

impl From<WireEvent> for TransportEvent {
    fn from(wire: WireEvent) -> Self {
        match wire {
            WireEvent::CallStarted => TransportEvent::CallStarted,
            WireEvent::CallEnded => TransportEvent::CallEnded,
            WireEvent::AgentStartTalking => TransportEvent::AgentStartTalking,
            WireEvent::AgentStopTalking => TransportEvent::AgentStopTalking,
            WireEvent::Update { transcript } => TransportEvent::Update { transcript },
            WireEvent::Error { message } => TransportEvent::Error(message),
        }
    }
}

/// WebSocket-backed transport client for one call.
pub struct WsTransport {
    endpoint: String,
    stop_tx: Mutex<Option<oneshot::Sender<()>>>,
}

impl WsTransport {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            stop_tx: Mutex::new(None),
        }
    }
}

#[async_trait]
impl TransportClient for WsTransport {
    async fn start_call(
        &self,
        access_token: &str,
    ) -> Result<mpsc::Receiver<TransportEvent>, TransportError> {
        let url = format!("{}?access_token={}", self.endpoint, access_token);

        let (ws, _) = connect_async(url.as_str())
            .await
            .map_err(|e| TransportError(format!("websocket connect failed: {e}")))?;

        info!("Transport connected to {}", self.endpoint);

        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let (stop_tx, mut stop_rx) = oneshot::channel();

        {
            let mut slot = self.stop_tx.lock().await;
            *slot = Some(stop_tx);
        }

        tokio::spawn(async move {
            let (mut sink, mut stream) = ws.split();

            loop {
                tokio::select! {
                    _ = &mut stop_rx => {
                        if let Err(e) = sink.send(Message::Close(None)).await {
                            warn!("Failed to close transport cleanly: {}", e);
                        }
                        break;
                    }
                    msg = stream.next() => {
                        let msg = match msg {
                            Some(Ok(m)) => m,
                            Some(Err(e)) => {
                                let _ = event_tx
                                    .send(TransportEvent::Error(e.to_string()))
                                    .await;
                                break;
                            }
                            None => {
                                let _ = event_tx.send(TransportEvent::CallEnded).await;
                                break;
                            }
                        };

                        let text = match msg {
                            Message::Text(text) => text,
                            Message::Close(_) => {
                                let _ = event_tx.send(TransportEvent::CallEnded).await;
                                break;
                            }
                            // Audio frames are played out elsewhere; only JSON
                            // event frames drive the session.
                            _ => continue,
                        };

                        match serde_json::from_str::<WireEvent>(&text) {
                            Ok(wire) => {
                                if event_tx.send(wire.into()).await.is_err() {
                                    // Listener detached, the call is over.
                                    break;
                                }
                            }
                            Err(e) => warn!("Unparseable transport frame: {}", e),
                        }
                    }
                }
            }

            info!("Transport event task stopped");
        });

        Ok(event_rx)
    }

    async fn stop_call(&self) {
        let stop_tx = {
            let mut slot = self.stop_tx.lock().await;
            slot.take()
        };

        if let Some(tx) = stop_tx {
            let _ = tx.send(());
        }
    }
}

/// Builds a fresh `WsTransport` per call against a fixed provider endpoint.
pub struct WsTransportFactory {
    endpoint: String,
}

impl WsTransportFactory {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

impl TransportFactory for WsTransportFactory {
    fn new_client(&self) -> Arc<dyn TransportClient> {
        Arc::new(WsTransport::new(self.endpoint.clone()))
    }
}

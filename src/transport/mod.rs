//! Transport session client: the real-time audio/transcript connection that
//! actually conducts the voice interview.
//!
//! The connection is modeled as a small event/command surface:
//! - commands: `start_call(access_token)`, `stop_call()`
//! - events: call started/ended, agent start/stop talking, transcript
//!   updates, transport errors
//!
//! One client instance belongs to exactly one call; the controller owns it
//! for the lifetime of that call.

mod client;
mod events;
mod permissions;
mod ws;

pub use client::{TransportClient, TransportFactory};
pub use events::{Role, TranscriptTurn, TransportEvent};
pub use permissions::{AssumeGranted, PermissionProbe};
pub use ws::{WsTransport, WsTransportFactory};

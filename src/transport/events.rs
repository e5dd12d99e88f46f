use serde::{Deserialize, Serialize};

/// Who produced a transcript turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Agent,
    User,
}

/// One turn of the conversation as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptTurn {
    pub role: Role,
    pub content: String,
}

/// Events emitted by the transport session client, delivered strictly in
/// provider emission order.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    CallStarted,
    CallEnded,
    AgentStartTalking,
    AgentStopTalking,
    /// Latest transcript content. The provider resends the running transcript;
    /// consumers keep only the most recent turn per role.
    Update { transcript: Vec<TranscriptTurn> },
    Error(String),
}

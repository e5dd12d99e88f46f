use crate::transport::Role;
use serde::Serialize;

/// Lifecycle of one interview call.
///
/// `Idle -> AwaitingConsent -> Registering -> Calling -> Ending -> Ended`,
/// with `Ineligible` terminal and reachable only before registration.
/// `Ended` is absorbing; no path skips `Registering`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    AwaitingConsent,
    Registering,
    Calling,
    Ending,
    Ended,
    Ineligible,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Ended | SessionState::Ineligible)
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::Idle
    }
}

/// Whose turn is currently audible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActiveTurn {
    None,
    Agent,
    User,
}

impl Default for ActiveTurn {
    fn default() -> Self {
        Self::None
    }
}

/// Ephemeral per-call state, owned exclusively by one session controller.
/// Snapshots of it back the status endpoint; nothing here is durable.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CallSession {
    pub call_id: Option<String>,
    pub state: SessionState,
    pub active_turn: ActiveTurn,
    /// Latest agent utterance. Overwritten on every transcript update; only
    /// the most recent turn per role is displayed.
    pub agent_utterance: Option<String>,
    /// Latest participant utterance, same overwrite rule.
    pub user_utterance: Option<String>,
    pub elapsed_seconds: u64,
    pub tab_switch_count: u32,
}

impl CallSession {
    /// Apply one transcript update: keep the newest turn per role, drop the
    /// rest.
    pub fn apply_transcript(&mut self, transcript: &[crate::transport::TranscriptTurn]) {
        for turn in transcript {
            match turn.role {
                Role::Agent => self.agent_utterance = Some(turn.content.clone()),
                Role::User => self.user_utterance = Some(turn.content.clone()),
            }
        }
    }
}

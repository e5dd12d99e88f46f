//! Outward-facing collaborators: the call provider (registration and call
//! retrieval) and the response backend (durable per-call records).
//!
//! Both are traits so the session runtime can be driven against fakes; the
//! production implementations in [`http`] talk REST.

mod http;

pub use http::{BackendStore, ProviderClient};

use crate::error::{ProviderError, RegistrationError};
use crate::transport::TranscriptTurn;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// What the provider needs to mint a call session.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterCallRequest {
    pub agent_id: String,
    /// Per-call template variables the agent prompt interpolates
    /// (interview title, respondent name, session texts, ...).
    pub dynamic_variables: HashMap<String, String>,
}

/// Successful registration: the token authorizes exactly one transport start.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisteredCall {
    pub access_token: String,
    pub call_id: String,
}

/// Provider-side record of a finished call. Retrieval may be slow and
/// eventually consistent; analytics can lag the transcript.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallRecord {
    pub call_id: String,
    #[serde(default)]
    pub transcript: Vec<TranscriptTurn>,
    #[serde(default)]
    pub analytics: Option<serde_json::Value>,
    #[serde(default)]
    pub duration_ms: Option<u64>,
}

/// Post-call participant feedback, captured after the interview ends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feedback {
    pub rating: u8,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Partial update applied to the durable response row for a call.
///
/// Only the populated fields are written, which is what makes the two-phase
/// finalization safe: the end flag lands first and is never rolled back when
/// the analytics write later fails.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResponseUpdate {
    pub call_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_ended: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tab_switch_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<Vec<TranscriptTurn>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analytics: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<Feedback>,
}

impl ResponseUpdate {
    /// Phase-one finalization payload: mark the call ended, nothing more.
    pub fn ended(call_id: &str, tab_switch_count: u32) -> Self {
        Self {
            call_id: call_id.to_string(),
            is_ended: Some(true),
            ended_at: Some(chrono::Utc::now()),
            tab_switch_count: Some(tab_switch_count),
            ..Default::default()
        }
    }
}

/// Call provider API: registration before the call, retrieval after it.
#[async_trait]
pub trait CallRegistrar: Send + Sync {
    /// Register a new call. Quota exhaustion is reported distinctly from
    /// generic failures because the remediation differs.
    async fn register_call(
        &self,
        req: &RegisterCallRequest,
    ) -> Result<RegisteredCall, RegistrationError>;

    /// Fetch transcript and provider metadata for a finished call. For long
    /// interviews this can take minutes server-side.
    async fn retrieve_call(&self, call_id: &str) -> Result<CallRecord, ProviderError>;
}

/// Durable response storage, keyed by call id.
#[async_trait]
pub trait ResponseStore: Send + Sync {
    /// Idempotent upsert: repeating the same update is safe.
    async fn upsert_response(&self, update: &ResponseUpdate) -> Result<(), ProviderError>;

    /// Emails that have already completed a response for the interview.
    async fn responded_emails(&self, interview_id: &str) -> Result<HashSet<String>, ProviderError>;
}

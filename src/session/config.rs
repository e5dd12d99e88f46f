use serde::{Deserialize, Serialize};

/// Read-only interview definition, owned by the dashboard's CRUD layer and
/// consumed here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewConfig {
    /// Interview identifier (e.g. "iv-2026-08-product-research")
    pub interview_id: String,

    /// Conversational-engine agent that conducts this interview
    pub agent_id: String,

    /// Hard bound on call length, enforced locally as a backstop
    pub time_duration_minutes: u64,

    /// Ordered deep-dive session texts (at most 10)
    #[serde(default)]
    pub sessions: Vec<String>,

    /// Optional respondent allow-list; non-empty means invitation-only
    #[serde(default)]
    pub respondents: Option<Vec<String>>,

    /// Anonymous interviews collect no participant identity
    #[serde(default)]
    pub is_anonymous: bool,
}

impl Default for InterviewConfig {
    fn default() -> Self {
        Self {
            interview_id: format!("iv-{}", uuid::Uuid::new_v4()),
            agent_id: String::new(),
            time_duration_minutes: 10,
            sessions: Vec::new(),
            respondents: None,
            is_anonymous: false,
        }
    }
}

/// Participant identity, used for the eligibility check and passed through to
/// registration and persistence. Both fields are optional for anonymous
/// interviews.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Respondent {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

use thiserror::Error;

/// Why the eligibility guard turned a participant away.
///
/// Rejection is a business decision, not a failure: it is surfaced as an
/// informational message and the attempt is terminal for this participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    /// The participant has already completed a response for this interview.
    AlreadyResponded,
    /// The interview restricts respondents and this email is not on the list.
    NotInvited,
}

impl std::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectionReason::AlreadyResponded => {
                write!(f, "you have already responded to this interview")
            }
            RejectionReason::NotInvited => {
                write!(f, "you are not on the respondent list for this interview")
            }
        }
    }
}

/// Call registration rejected by the provider before any session existed.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// The organization's call quota or plan allowance is exhausted.
    /// Actionable for the operator, not the participant.
    #[error("call quota exhausted, contact the interview operator")]
    QuotaExhausted,

    #[error("call registration failed: {0}")]
    Other(String),
}

/// Failure talking to the call provider or the response backend.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Mid-call transport failure. Forces termination through the same path as a
/// user-initiated end.
#[derive(Debug, Clone, Error)]
#[error("transport error: {0}")]
pub struct TransportError(pub String);

/// Everything that can stop a call attempt before the call is live.
///
/// Each variant leaves the controller in a defined terminal state:
/// `Ineligible` for rejections, back to `Idle` for the rest.
#[derive(Debug, Error)]
pub enum StartError {
    #[error("microphone permission denied")]
    PermissionDenied,

    #[error("not eligible: {0}")]
    Ineligible(RejectionReason),

    /// The responded-participants lookup failed, so eligibility could not
    /// be decided. No registration was attempted.
    #[error("eligibility check failed: {0}")]
    EligibilityCheck(#[source] ProviderError),

    #[error(transparent)]
    Registration(#[from] RegistrationError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A call is already starting or in progress on this controller.
    /// Concurrent start attempts are rejected, never queued.
    #[error("a call is already in progress")]
    CallInProgress,
}

/// Finalization trouble after the session was already durably marked ended.
/// Degrades gracefully: the interview did not fail, analysis is delayed.
#[derive(Debug, Error)]
pub enum FinalizeError {
    #[error("failed to persist end-of-call record: {0}")]
    Persist(#[source] ProviderError),

    #[error("transcript/analytics retrieval failed: {0}")]
    Retrieval(#[source] ProviderError),
}

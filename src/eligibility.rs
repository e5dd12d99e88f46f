//! Eligibility guard: decides once, before registration, whether a
//! participant may start a session. Rejection is terminal for the attempt
//! and no further network calls are made on behalf of that identity.

use crate::error::{ProviderError, RejectionReason};
use crate::provider::ResponseStore;
use crate::session::InterviewConfig;
use std::collections::HashSet;
use tracing::info;

/// Outcome of the guard check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    Eligible,
    Rejected(RejectionReason),
}

fn normalize(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

/// Pure decision over the participant's email, the set of emails that have
/// already completed this interview, and the optional allow-list.
///
/// Rules, in order:
/// 1. already responded -> rejected
/// 2. non-empty allow-list without this email -> rejected
/// 3. otherwise eligible
///
/// A missing email skips the history check, but a non-empty allow-list still
/// rejects it: an anonymous participant cannot prove an invitation.
pub fn evaluate(
    email: Option<&str>,
    prior_responders: &HashSet<String>,
    allow_list: Option<&[String]>,
) -> Eligibility {
    let email = email.map(normalize);

    if let Some(email) = &email {
        if prior_responders.contains(email) {
            return Eligibility::Rejected(RejectionReason::AlreadyResponded);
        }
    }

    if let Some(allowed) = allow_list {
        if !allowed.is_empty() {
            let invited = match &email {
                Some(email) => allowed.iter().any(|a| normalize(a) == *email),
                None => false,
            };
            if !invited {
                return Eligibility::Rejected(RejectionReason::NotInvited);
            }
        }
    }

    Eligibility::Eligible
}

/// Guard bound to one interview; fetches prior-response history and applies
/// [`evaluate`].
pub struct EligibilityGuard<'a> {
    store: &'a dyn ResponseStore,
}

impl<'a> EligibilityGuard<'a> {
    pub fn new(store: &'a dyn ResponseStore) -> Self {
        Self { store }
    }

    pub async fn check(
        &self,
        interview: &InterviewConfig,
        email: Option<&str>,
    ) -> Result<Eligibility, ProviderError> {
        let prior = self.store.responded_emails(&interview.interview_id).await?;

        let outcome = evaluate(email, &prior, interview.respondents.as_deref());

        if let Eligibility::Rejected(reason) = outcome {
            info!(
                "Participant rejected for interview {}: {}",
                interview.interview_id, reason
            );
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prior(emails: &[&str]) -> HashSet<String> {
        emails.iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn prior_responder_rejected_regardless_of_allow_list() {
        let prior = prior(&["ada@example.com"]);
        let allow = vec!["ada@example.com".to_string()];

        assert_eq!(
            evaluate(Some("ada@example.com"), &prior, Some(&allow)),
            Eligibility::Rejected(RejectionReason::AlreadyResponded)
        );
        assert_eq!(
            evaluate(Some("ada@example.com"), &prior, None),
            Eligibility::Rejected(RejectionReason::AlreadyResponded)
        );
    }

    #[test]
    fn uninvited_rejected_even_without_prior_response() {
        let allow = vec!["grace@example.com".to_string()];

        assert_eq!(
            evaluate(Some("ada@example.com"), &prior(&[]), Some(&allow)),
            Eligibility::Rejected(RejectionReason::NotInvited)
        );
    }

    #[test]
    fn invited_first_timer_accepted() {
        let allow = vec!["ada@example.com".to_string()];

        assert_eq!(
            evaluate(Some("ada@example.com"), &prior(&[]), Some(&allow)),
            Eligibility::Eligible
        );
    }

    #[test]
    fn empty_allow_list_means_open_interview() {
        let allow: Vec<String> = vec![];

        assert_eq!(
            evaluate(Some("ada@example.com"), &prior(&[]), Some(&allow)),
            Eligibility::Eligible
        );
    }

    #[test]
    fn email_comparison_is_case_and_whitespace_insensitive() {
        let prior = prior(&["ada@example.com"]);

        assert_eq!(
            evaluate(Some("  Ada@Example.COM "), &prior, None),
            Eligibility::Rejected(RejectionReason::AlreadyResponded)
        );
    }

    #[test]
    fn anonymous_passes_open_interview_but_not_restricted_one() {
        let allow = vec!["grace@example.com".to_string()];

        assert_eq!(evaluate(None, &prior(&[]), None), Eligibility::Eligible);
        assert_eq!(
            evaluate(None, &prior(&[]), Some(&allow)),
            Eligibility::Rejected(RejectionReason::NotInvited)
        );
    }
}

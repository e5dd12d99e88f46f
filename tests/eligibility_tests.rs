// Guard-level tests: eligibility evaluated against the response store.

mod common;

use canvass::eligibility::{Eligibility, EligibilityGuard};
use canvass::error::RejectionReason;
use canvass::session::InterviewConfig;
use common::FakeStore;

fn open_interview() -> InterviewConfig {
    InterviewConfig {
        interview_id: "iv-guard".to_string(),
        agent_id: "agent-test".to_string(),
        time_duration_minutes: 10,
        sessions: vec![],
        respondents: None,
        is_anonymous: false,
    }
}

#[tokio::test]
async fn first_time_participant_passes() {
    let store = FakeStore::new();
    let guard = EligibilityGuard::new(store.as_ref());

    let outcome = guard
        .check(&open_interview(), Some("ada@example.com"))
        .await
        .unwrap();

    assert_eq!(outcome, Eligibility::Eligible);
}

#[tokio::test]
async fn prior_response_wins_over_allow_list_membership() {
    let store = FakeStore::with_prior(&["ada@example.com"]).await;
    let guard = EligibilityGuard::new(store.as_ref());

    let mut config = open_interview();
    config.respondents = Some(vec!["ada@example.com".to_string()]);

    let outcome = guard
        .check(&config, Some("ada@example.com"))
        .await
        .unwrap();

    assert_eq!(
        outcome,
        Eligibility::Rejected(RejectionReason::AlreadyResponded)
    );
}

#[tokio::test]
async fn restricted_interview_rejects_unknown_email() {
    let store = FakeStore::new();
    let guard = EligibilityGuard::new(store.as_ref());

    let mut config = open_interview();
    config.respondents = Some(vec!["grace@example.com".to_string()]);

    let outcome = guard
        .check(&config, Some("ada@example.com"))
        .await
        .unwrap();

    assert_eq!(outcome, Eligibility::Rejected(RejectionReason::NotInvited));
}

#[tokio::test]
async fn anonymous_interview_without_allow_list_is_open() {
    let store = FakeStore::new();
    let guard = EligibilityGuard::new(store.as_ref());

    let mut config = open_interview();
    config.is_anonymous = true;

    let outcome = guard.check(&config, None).await.unwrap();

    assert_eq!(outcome, Eligibility::Eligible);
}

// Claim-flow controller tests: authenticated short-circuit, retry budget,
// and authentication-check failures.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::*;
use egc::{AttemptOutcome, ClaimFlowController, LoginFlow, LoginState, NotificationSink, SiteConfig};
use tempfile::TempDir;

fn controller(
    session: Arc<dyn egc::Session>,
    tmp: &TempDir,
    sink: &Arc<RecordingSink>,
) -> ClaimFlowController {
    let flow = LoginFlow::new(session, Arc::new(settings(tmp)))
        .with_notifier(Arc::clone(sink) as Arc<dyn NotificationSink>)
        .with_timings(fast_timings());
    ClaimFlowController::new(flow)
}

#[tokio::test]
async fn test_already_logged_in_skips_login() {
    let site = SiteConfig::default();
    let tmp = TempDir::new().unwrap();
    let (session, ctl) = session_pair(login_page());
    ctl.set_attribute(&site.logged_in_marker, &site.logged_in_attribute, "true");
    let sink = Arc::new(RecordingSink::default());

    let outcome = controller(session, &tmp, &sink).run().await;

    assert_eq!(outcome, AttemptOutcome::AlreadyAuthenticated);
    assert_eq!(ctl.gotos(&site.claim_url), 1);
    assert_eq!(ctl.gotos(&site.login_url), 0);
    assert_eq!(ctl.clicks(&site.sign_in_button), 0);
    assert!(sink.calls().is_empty());
}

#[tokio::test]
async fn test_repeated_runs_when_authenticated_are_idempotent() {
    let site = SiteConfig::default();
    let tmp = TempDir::new().unwrap();
    let (session, ctl) = session_pair(login_page());
    ctl.set_attribute(&site.logged_in_marker, &site.logged_in_attribute, "true");
    let sink = Arc::new(RecordingSink::default());
    let controller = controller(session, &tmp, &sink);

    assert_eq!(controller.run().await, AttemptOutcome::AlreadyAuthenticated);
    assert_eq!(controller.run().await, AttemptOutcome::AlreadyAuthenticated);

    assert_eq!(ctl.gotos(&site.claim_url), 2);
    assert_eq!(ctl.gotos(&site.login_url), 0);
}

#[tokio::test]
async fn test_logs_in_when_not_authenticated() {
    let site = SiteConfig::default();
    let tmp = TempDir::new().unwrap();
    let (session, ctl) = session_pair(login_page().element("#yes"));
    script_success(&ctl, Duration::from_millis(20), Duration::from_millis(600));
    let sink = Arc::new(RecordingSink::default());

    let outcome = controller(session, &tmp, &sink).run().await;

    assert_eq!(outcome, AttemptOutcome::Success);
    assert_eq!(ctl.gotos(&site.claim_url), 1);
    assert_eq!(ctl.gotos(&site.login_url), 1);
    assert_eq!(ctl.clicks("#yes"), 1);
    assert!(sink.calls().is_empty());
}

#[tokio::test]
async fn test_failed_logins_are_retried_up_to_budget() {
    let site = SiteConfig::default();
    let tmp = TempDir::new().unwrap();
    let (session, ctl) = session_pair(login_page());
    let sink = Arc::new(RecordingSink::default());

    let outcome = controller(session, &tmp, &sink).run().await;

    match outcome {
        AttemptOutcome::Failure { failed_at, screenshot, .. } => {
            assert_eq!(failed_at, LoginState::AwaitingLoginSignal);
            assert!(screenshot.is_some());
        }
        other => panic!("expected failure, got {other:?}"),
    }
    assert_eq!(ctl.gotos(&site.login_url), egc::MAX_LOGIN_ATTEMPTS);
    // One check per attempt plus the final one before giving up.
    assert_eq!(ctl.gotos(&site.claim_url), egc::MAX_LOGIN_ATTEMPTS + 1);

    let failures = sink.login_failures();
    assert_eq!(failures.len(), egc::MAX_LOGIN_ATTEMPTS);
    assert!(failures.iter().all(|(account, _)| account == EMAIL));
}

#[tokio::test]
async fn test_custom_login_budget() {
    let site = SiteConfig::default();
    let tmp = TempDir::new().unwrap();
    let (session, ctl) = session_pair(login_page());
    let sink = Arc::new(RecordingSink::default());

    let outcome = controller(session, &tmp, &sink)
        .with_max_login_attempts(1)
        .run()
        .await;

    assert!(!outcome.is_success());
    assert_eq!(ctl.gotos(&site.login_url), 1);
    assert_eq!(sink.login_failures().len(), 1);
}

#[tokio::test]
async fn test_check_failures_have_their_own_budget() {
    let site = SiteConfig::default();
    let tmp = TempDir::new().unwrap();
    let (session, ctl) = session_pair(login_page());
    ctl.fail_navigation(&site.claim_url);
    let sink = Arc::new(RecordingSink::default());

    let outcome = controller(session, &tmp, &sink).run().await;

    match outcome {
        AttemptOutcome::Failure { failed_at, reason, screenshot } => {
            assert_eq!(failed_at, LoginState::Start);
            assert!(reason.contains("Navigation"), "{reason}");
            assert!(screenshot.is_none());
        }
        other => panic!("expected failure, got {other:?}"),
    }
    assert_eq!(ctl.gotos(&site.claim_url), egc::MAX_AUTH_CHECK_FAILURES);
    assert_eq!(ctl.gotos(&site.login_url), 0);
    assert!(sink.calls().is_empty());
}

#[tokio::test]
async fn test_missing_marker_counts_as_check_failure() {
    let site = SiteConfig::default();
    let tmp = TempDir::new().unwrap();
    let (session, ctl) = session_pair(egc::fake_session::FakeSessionBuilder::new());
    let sink = Arc::new(RecordingSink::default());

    let outcome = controller(session, &tmp, &sink)
        .with_max_check_failures(2)
        .run()
        .await;

    assert!(!outcome.is_success());
    assert_eq!(ctl.gotos(&site.claim_url), 2);
    assert_eq!(ctl.gotos(&site.login_url), 0);
}

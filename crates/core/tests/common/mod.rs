// Shared fixtures for login flow and controller tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use egc::fake_session::{FakeSession, FakeSessionBuilder, FakeSessionController};
use egc::protocol::NetworkResponse;
use egc::{Credentials, LoginTimings, NotificationSink, Settings, SiteConfig};
use parking_lot::Mutex;
use serde_json::json;
use tempfile::TempDir;

pub const EMAIL: &str = "player@example.com";
pub const PASSWORD: &str = "correct horse battery staple";

/// RFC 6238 appendix B seed in base32.
pub const RFC_SEED: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";

pub fn fast_timings() -> LoginTimings {
    LoginTimings {
        settle: Duration::from_millis(5),
        otp_field_timeout: Duration::from_millis(200),
        challenge_timeout: Duration::from_millis(500),
        login_signal_timeout: Duration::from_millis(300),
        validation_timeout: Duration::from_secs(2),
        prompt_poll_interval: Duration::from_millis(20),
        prompt_probe_timeout: Duration::from_millis(30),
    }
}

pub fn settings(screenshots: &TempDir) -> Settings {
    let mut settings = Settings::new(Credentials::new(EMAIL, PASSWORD));
    settings.screenshots_dir = screenshots.path().to_path_buf();
    settings
}

pub fn settings_with_totp(screenshots: &TempDir) -> Settings {
    let mut settings = settings(screenshots);
    settings.credentials = settings.credentials.with_totp_secret(RFC_SEED);
    settings
}

/// Sign-in form with every field present and visible. Validation prompts
/// are not added.
pub fn login_page() -> FakeSessionBuilder {
    let site = SiteConfig::default();
    FakeSessionBuilder::new()
        .element(&site.email_input)
        .element(&site.continue_button)
        .element(&site.password_input)
        .element(&site.sign_in_button)
        .attribute(&site.logged_in_marker, &site.logged_in_attribute, "false")
}

pub fn with_otp_cells(builder: FakeSessionBuilder) -> FakeSessionBuilder {
    let site = SiteConfig::default();
    (0..6).fold(builder, |b, i| b.element(&site.otp_cell(i)))
}

pub fn analytics_success() -> NetworkResponse {
    NetworkResponse::post_json(
        "https://www.epicgames.com/id/api/analytics",
        &json!({"accountId": "0b9c2a", "displayName": "player"}),
    )
}

pub fn csrf_refreshed() -> NetworkResponse {
    NetworkResponse::post_json(
        "https://www.epicgames.com/account/v2/refresh-csrf",
        &json!({"success": true}),
    )
}

/// Sign-in click yields the login signal after `login_after`; opening the
/// account page yields the CSRF refresh after `csrf_after`.
pub fn script_success(controller: &FakeSessionController, login_after: Duration, csrf_after: Duration) {
    let site = SiteConfig::default();
    controller.on_click(&site.sign_in_button, login_after, analytics_success());
    controller.on_goto(&site.account_url, csrf_after, csrf_refreshed());
}

pub fn session_pair(builder: FakeSessionBuilder) -> (Arc<FakeSession>, FakeSessionController) {
    builder.build()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    LoginFailed { account: String, error: String },
    GameClaimed { title: String, success: bool },
    Summary { claimed: usize, failed: usize },
}

/// Sink that records every call and reports delivery.
#[derive(Default)]
pub struct RecordingSink {
    calls: Mutex<Vec<Notification>>,
}

impl RecordingSink {
    pub fn calls(&self) -> Vec<Notification> {
        self.calls.lock().clone()
    }

    pub fn login_failures(&self) -> Vec<(String, String)> {
        self.calls()
            .into_iter()
            .filter_map(|n| match n {
                Notification::LoginFailed { account, error } => Some((account, error)),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn notify_login_failed(&self, account: &str, error: &str) -> bool {
        self.calls.lock().push(Notification::LoginFailed {
            account: account.to_string(),
            error: error.to_string(),
        });
        true
    }

    async fn notify_game_claimed(&self, title: &str, success: bool, _url: Option<&str>) -> bool {
        self.calls.lock().push(Notification::GameClaimed {
            title: title.to_string(),
            success,
        });
        true
    }

    async fn notify_games_summary(&self, claimed: &[String], failed: &[String]) -> bool {
        self.calls.lock().push(Notification::Summary {
            claimed: claimed.len(),
            failed: failed.len(),
        });
        true
    }
}

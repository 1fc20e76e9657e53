//! Top-level authorization loop.
//!
//! [`ClaimFlowController::run`] makes sure the session is signed in before
//! the claim page is used: it checks the authenticated marker on the claim
//! page and only falls back to [`LoginFlow`] when the marker says otherwise.
//! Login attempts and failed authentication checks are budgeted separately.

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::Settings;
use crate::error::Result;
use crate::login::{AttemptOutcome, LoginFlow, LoginState};
use crate::session::{Session, WaitUntil};

/// Login attempts per run.
pub const MAX_LOGIN_ATTEMPTS: usize = 3;

/// Failed authentication checks (navigation or marker read errors) per run.
pub const MAX_AUTH_CHECK_FAILURES: usize = 3;

pub struct ClaimFlowController {
    login: LoginFlow,
    max_login_attempts: usize,
    max_check_failures: usize,
}

impl ClaimFlowController {
    pub fn new(login: LoginFlow) -> Self {
        Self {
            login,
            max_login_attempts: MAX_LOGIN_ATTEMPTS,
            max_check_failures: MAX_AUTH_CHECK_FAILURES,
        }
    }

    pub fn with_max_login_attempts(mut self, attempts: usize) -> Self {
        self.max_login_attempts = attempts;
        self
    }

    pub fn with_max_check_failures(mut self, failures: usize) -> Self {
        self.max_check_failures = failures.max(1);
        self
    }

    pub fn login_flow(&self) -> &LoginFlow {
        &self.login
    }

    fn session(&self) -> &dyn Session {
        &**self.login.session()
    }

    fn settings(&self) -> &Arc<Settings> {
        self.login.settings()
    }

    /// Opens the claim page and reads the authenticated-state marker.
    pub async fn is_authenticated(&self) -> Result<bool> {
        let site = &self.settings().site;
        self.session()
            .goto(&site.claim_url, WaitUntil::DomContentLoaded)
            .await?;
        let flag = self
            .session()
            .get_attribute(&site.logged_in_marker, &site.logged_in_attribute)
            .await?;
        Ok(flag.as_deref() == Some("true"))
    }

    /// Ensures the session is signed in. Never returns an error; the last
    /// failure is returned once a budget is exhausted.
    pub async fn run(&self) -> AttemptOutcome {
        let mut attempts = 0;
        let mut check_failures = 0;
        let mut last = AttemptOutcome::Failure {
            failed_at: LoginState::Start,
            reason: "no login attempt was made".to_string(),
            screenshot: None,
        };

        loop {
            match self.is_authenticated().await {
                Ok(true) => {
                    info!(target = "egc.controller", attempts, "already logged in");
                    return AttemptOutcome::AlreadyAuthenticated;
                }
                Ok(false) => {}
                Err(err) => {
                    check_failures += 1;
                    warn!(target = "egc.controller", error = %err, check_failures, "authentication check failed");
                    if check_failures >= self.max_check_failures {
                        last = AttemptOutcome::Failure {
                            failed_at: LoginState::Start,
                            reason: err.to_string(),
                            screenshot: None,
                        };
                        break;
                    }
                    continue;
                }
            }

            if attempts >= self.max_login_attempts {
                break;
            }
            attempts += 1;
            info!(target = "egc.controller", attempt = attempts, max = self.max_login_attempts, "starting login attempt");

            match self.login.attempt_login().await {
                AttemptOutcome::Success => return AttemptOutcome::Success,
                outcome => last = outcome,
            }
        }

        warn!(target = "egc.controller", attempts, check_failures, "authorization gave up");
        last
    }
}

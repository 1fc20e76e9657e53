//! The login state machine.
//!
//! One [`LoginFlow::attempt_login`] call walks the sign-in journey:
//!
//! ```text
//! Start → EmailEntry → PasswordEntry → Submitted
//!       → OtpPending (only with a TOTP seed, best-effort)
//!       → ChallengePending (best-effort)
//!       → AwaitingLoginSignal (bounded, fatal on expiry)
//!       → AccountValidation (bounded, fatal on expiry)
//!       → Success
//! ```
//!
//! Any error moves the attempt to `Failed`: a screenshot is written under
//! `{screenshots_dir}/authorization/`, one failure notification is sent and
//! [`AttemptOutcome::Failure`] is returned. Nothing escapes this boundary.
//!
//! Network side effects of the journey arrive out of band. A
//! [`ResponseObserver`] is subscribed for the duration of each attempt and
//! feeds two fresh signal queues, so a signal from a previous attempt can
//! never complete a later one.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use egc_protocol::{CsrfRefreshSignal, LoginSuccessSignal};
use tracing::{debug, info, trace, warn};

use crate::assertions::expect;
use crate::challenge::{ChallengeResolver, NoChallenge};
use crate::config::{Secret, Settings};
use crate::error::{Error, Result};
use crate::notify::{NotificationSink, TelegramNotifier};
use crate::observer::ResponseObserver;
use crate::session::{Session, WaitUntil};
use crate::signal::{SignalReceiver, signal_queue};
use crate::totp::{self, Totp};

/// Pause after typing or clicking on the sign-in form. The form animates
/// between steps and validates asynchronously without exposing a readiness
/// signal to automation.
pub const UI_SETTLE_DELAY: Duration = Duration::from_secs(2);

/// How long the one-time-password cells may take to render.
pub const OTP_FIELD_TIMEOUT: Duration = Duration::from_secs(15);

/// Upper bound for the challenge solver.
pub const CHALLENGE_TIMEOUT: Duration = Duration::from_secs(120);

/// Upper bound for the login success signal after submitting.
pub const LOGIN_SIGNAL_TIMEOUT: Duration = Duration::from_secs(60);

/// Upper bound for the whole post-login account validation.
pub const VALIDATION_TIMEOUT: Duration = Duration::from_secs(60);

/// Interval between prompt dismissal rounds.
pub const PROMPT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Visibility and click bound for a single prompt probe.
pub const PROMPT_PROBE_TIMEOUT: Duration = Duration::from_secs(1);

/// Timing policy of one attempt. Defaults to the constants above.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginTimings {
    pub settle: Duration,
    pub otp_field_timeout: Duration,
    pub challenge_timeout: Duration,
    pub login_signal_timeout: Duration,
    pub validation_timeout: Duration,
    pub prompt_poll_interval: Duration,
    pub prompt_probe_timeout: Duration,
}

impl Default for LoginTimings {
    fn default() -> Self {
        Self {
            settle: UI_SETTLE_DELAY,
            otp_field_timeout: OTP_FIELD_TIMEOUT,
            challenge_timeout: CHALLENGE_TIMEOUT,
            login_signal_timeout: LOGIN_SIGNAL_TIMEOUT,
            validation_timeout: VALIDATION_TIMEOUT,
            prompt_poll_interval: PROMPT_POLL_INTERVAL,
            prompt_probe_timeout: PROMPT_PROBE_TIMEOUT,
        }
    }
}

/// Position of an attempt in the sign-in journey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoginState {
    Start,
    EmailEntry,
    PasswordEntry,
    Submitted,
    OtpPending,
    ChallengePending,
    AwaitingLoginSignal,
    AccountValidation,
    Success,
    Failed,
}

impl LoginState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Failed)
    }
}

impl fmt::Display for LoginState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::EmailEntry => "email_entry",
            Self::PasswordEntry => "password_entry",
            Self::Submitted => "submitted",
            Self::OtpPending => "otp_pending",
            Self::ChallengePending => "challenge_pending",
            Self::AwaitingLoginSignal => "awaiting_login_signal",
            Self::AccountValidation => "account_validation",
            Self::Success => "success",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Result of one login attempt (or of a controller run).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success,
    Failure {
        /// Last state reached before the error.
        failed_at: LoginState,
        reason: String,
        /// Screenshot of the page at failure time, when one could be taken.
        screenshot: Option<PathBuf>,
    },
    AlreadyAuthenticated,
}

impl AttemptOutcome {
    /// True for both a fresh login and an existing authenticated session.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success | Self::AlreadyAuthenticated)
    }
}

/// Drives one account through the sign-in journey on a shared session.
pub struct LoginFlow {
    session: Arc<dyn Session>,
    settings: Arc<Settings>,
    resolver: Arc<dyn ChallengeResolver>,
    notifier: Arc<dyn NotificationSink>,
    timings: LoginTimings,
    clock: fn() -> Result<u64>,
}

impl LoginFlow {
    /// Creates a flow with no challenge solver and the Telegram notifier
    /// configured from `settings`.
    pub fn new(session: Arc<dyn Session>, settings: Arc<Settings>) -> Self {
        let notifier = Arc::new(TelegramNotifier::from_settings(&settings.telegram));
        Self {
            session,
            settings,
            resolver: Arc::new(NoChallenge),
            notifier,
            timings: LoginTimings::default(),
            clock: totp::unix_now,
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn ChallengeResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn NotificationSink>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_timings(mut self, timings: LoginTimings) -> Self {
        self.timings = timings;
        self
    }

    /// Replaces the unix-seconds clock used for one-time codes and
    /// screenshot names.
    pub fn with_clock(mut self, clock: fn() -> Result<u64>) -> Self {
        self.clock = clock;
        self
    }

    pub fn session(&self) -> &Arc<dyn Session> {
        &self.session
    }

    pub fn settings(&self) -> &Arc<Settings> {
        &self.settings
    }

    pub fn timings(&self) -> &LoginTimings {
        &self.timings
    }

    /// Runs one attempt. Never returns an error.
    pub async fn attempt_login(&self) -> AttemptOutcome {
        let mut state = LoginState::Start;
        match self.drive(&mut state).await {
            Ok(()) => AttemptOutcome::Success,
            Err(err) => self.fail(state, err).await,
        }
    }

    async fn drive(&self, state: &mut LoginState) -> Result<()> {
        let session = &*self.session;
        let site = &self.settings.site;
        let credentials = &self.settings.credentials;

        self.settings.validate()?;

        // Before any navigation: the solver watches page events from the start.
        self.resolver.attach(session).await?;

        let (login_tx, mut login_rx) = signal_queue::<LoginSuccessSignal>("login success signal");
        let (csrf_tx, mut csrf_rx) = signal_queue::<CsrfRefreshSignal>("csrf refresh signal");
        let _observer = ResponseObserver::new(site.observer.clone(), login_tx, csrf_tx).spawn(session.subscribe_responses());

        transition(state, LoginState::EmailEntry);
        session
            .goto(&site.login_url, WaitUntil::DomContentLoaded)
            .await?;
        self.enter_text(&site.email_input, &credentials.email).await?;
        debug!(target = "egc.login", email = %credentials.email, "email entered");
        self.settle().await;
        session.click(&site.continue_button, None).await?;
        self.settle().await;

        transition(state, LoginState::PasswordEntry);
        self.enter_text(&site.password_input, credentials.password.expose())
            .await?;
        debug!(target = "egc.login", "password entered");
        self.settle().await;
        session.click(&site.sign_in_button, None).await?;
        transition(state, LoginState::Submitted);

        let seed = credentials.totp_secret.as_ref().filter(|s| !s.expose().trim().is_empty());
        if let Some(seed) = seed {
            transition(state, LoginState::OtpPending);
            match self.submit_otp(seed).await {
                Ok(()) => debug!(target = "egc.login", "one-time code submitted"),
                Err(err) => warn!(target = "egc.login", error = %err, "OTP handling failed or not required"),
            }
        }

        transition(state, LoginState::ChallengePending);
        self.await_challenge().await;

        transition(state, LoginState::AwaitingLoginSignal);
        let signal = login_rx
            .recv_timeout(self.timings.login_signal_timeout)
            .await?;
        info!(target = "egc.login", account_id = %signal.account_id, "login success");

        transition(state, LoginState::AccountValidation);
        let bound = self.timings.validation_timeout;
        tokio::time::timeout(bound, self.validate_account(&mut csrf_rx))
            .await
            .map_err(|_| Error::timeout(bound, "account validation"))??;
        info!(target = "egc.login", "account validation success");

        transition(state, LoginState::Success);
        Ok(())
    }

    async fn enter_text(&self, selector: &str, text: &str) -> Result<()> {
        self.session.clear(selector).await?;
        self.session.type_text(selector, text).await
    }

    async fn settle(&self) {
        tokio::time::sleep(self.timings.settle).await;
    }

    /// Fills the six single-digit cells with the current code, digit `i`
    /// into cell `i`, then submits.
    async fn submit_otp(&self, seed: &Secret) -> Result<()> {
        let session = &*self.session;
        let site = &self.settings.site;
        let totp = Totp::from_base32(seed.expose())?;

        let first_cell = site.otp_cell(0);
        expect(session, &first_cell)
            .with_timeout(self.timings.otp_field_timeout)
            .to_be_visible()
            .await?;

        let code = totp.code_at((self.clock)()?);
        for (index, digit) in code.chars().enumerate() {
            let cell = site.otp_cell(index);
            session.click(&cell, None).await?;
            session.fill(&cell, &digit.to_string()).await?;
            trace!(target = "egc.login", index, "otp digit entered");
        }

        session.click(&site.continue_button, None).await
    }

    async fn await_challenge(&self) {
        let session = &*self.session;
        let bound = self.timings.challenge_timeout;
        match tokio::time::timeout(bound, self.resolver.wait_for_challenge(session)).await {
            Ok(Ok(())) => debug!(target = "egc.login", "challenge solved or absent"),
            Ok(Err(err)) => warn!(target = "egc.login", error = %err, "challenge handling skipped"),
            Err(_) => warn!(target = "egc.login", timeout = ?bound, "challenge solver timed out"),
        }
    }

    /// Dismisses the optional prompts shown after a long absence until the
    /// CSRF refresh arrives or every prompt has been handled.
    async fn validate_account(&self, csrf_rx: &mut SignalReceiver<CsrfRefreshSignal>) -> Result<()> {
        let site = &self.settings.site;
        self.session
            .goto(&site.account_url, WaitUntil::NetworkIdle)
            .await?;

        let mut pending: Vec<&str> = site.validation_prompts.iter().map(String::as_str).collect();
        let mut csrf_open = true;

        while !pending.is_empty() {
            tokio::select! {
                biased;
                signal = csrf_rx.recv(), if csrf_open => match signal {
                    Some(_) => {
                        debug!(target = "egc.login", remaining = pending.len(), "csrf refreshed, validation complete");
                        return Ok(());
                    }
                    None => csrf_open = false,
                },
                _ = async {
                    tokio::time::sleep(self.timings.prompt_poll_interval).await;
                    self.dismiss_round(&mut pending).await;
                } => {}
            }
        }

        debug!(target = "egc.login", "all validation prompts handled");
        Ok(())
    }

    async fn dismiss_round(&self, pending: &mut Vec<&str>) {
        for selector in pending.clone() {
            if self.dismiss_prompt(selector).await {
                pending.retain(|s| *s != selector);
            }
        }
    }

    async fn dismiss_prompt(&self, selector: &str) -> bool {
        let session = &*self.session;
        let probe = self.timings.prompt_probe_timeout;

        let result = async {
            expect(session, selector).with_timeout(probe).to_be_visible().await?;
            session.click(selector, Some(probe)).await
        }
        .await;

        match result {
            Ok(()) => {
                info!(target = "egc.login", selector, "validation prompt dismissed");
                true
            }
            Err(err) => {
                trace!(target = "egc.login", selector, error = %err, "validation prompt not present");
                false
            }
        }
    }

    async fn fail(&self, mut state: LoginState, err: Error) -> AttemptOutcome {
        let failed_at = state;
        transition(&mut state, LoginState::Failed);
        warn!(target = "egc.login", %failed_at, error = %err, "login attempt failed");

        let screenshot = self.capture_failure_screenshot().await;
        let reason = err.to_string();
        self.notifier
            .notify_login_failed(&self.settings.credentials.email, &reason)
            .await;

        AttemptOutcome::Failure {
            failed_at,
            reason,
            screenshot,
        }
    }

    async fn capture_failure_screenshot(&self) -> Option<PathBuf> {
        let dir = self.settings.authorization_screenshots_dir();
        let timestamp = (self.clock)().unwrap_or_default();
        let path = dir.join(format!("login-{timestamp}.png"));

        let result: Result<()> = async {
            tokio::fs::create_dir_all(&dir).await?;
            self.session.screenshot(&path).await
        }
        .await;

        match result {
            Ok(()) => {
                info!(target = "egc.login", path = %path.display(), "failure screenshot saved");
                Some(path)
            }
            Err(err) => {
                warn!(target = "egc.login", path = %path.display(), error = %err, "failed to capture screenshot");
                None
            }
        }
    }
}

fn transition(state: &mut LoginState, next: LoginState) {
    debug!(target = "egc.login", from = %state, to = %next, "state transition");
    *state = next;
}

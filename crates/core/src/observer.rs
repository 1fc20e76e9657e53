//! Passive classification of network responses into login signals.
//!
//! The observer subscribes to the session's response stream for the
//! lifetime of one login attempt. Every response is classified on its own:
//! a body that is not JSON, or JSON of an unexpected shape, is dropped
//! without affecting the responses that follow.
//!
//! Classification, first match wins:
//!
//! 1. login endpoint with a truthy `errorCode` → [`ResponseKind::LoginError`]
//!    (logged, no signal)
//! 2. analytics endpoint with a truthy `accountId` →
//!    [`ResponseKind::AnalyticsSuccess`] (a [`LoginSuccessSignal`])
//! 3. CSRF refresh endpoint with `success: true` →
//!    [`ResponseKind::CsrfRefreshed`] (a [`CsrfRefreshSignal`])
//! 4. anything else → [`ResponseKind::Ignored`]
//!
//! Only `POST` responses are considered, and URLs matching an exclusion
//! marker (third-party challenge traffic) are skipped before parsing.

use egc_protocol::{CsrfRefreshSignal, LoginSuccessSignal, NetworkResponse, ResponseEvent, ResponseKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, error, trace};

use crate::session::ResponseSubscription;
use crate::signal::SignalSender;

/// URL markers used to recognise the endpoints of interest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObserverRules {
    /// Responses whose URL contains any of these are never parsed.
    pub excluded_url_markers: Vec<String>,
    pub login_marker: String,
    pub analytics_marker: String,
    pub csrf_marker: String,
}

impl Default for ObserverRules {
    fn default() -> Self {
        Self {
            excluded_url_markers: vec!["talon".to_string()],
            login_marker: "/id/api/login".to_string(),
            analytics_marker: "/id/api/analytics".to_string(),
            csrf_marker: "/account/v2/refresh-csrf".to_string(),
        }
    }
}

impl ObserverRules {
    fn is_excluded(&self, url: &str) -> bool {
        self.excluded_url_markers.iter().any(|m| !m.is_empty() && url.contains(m.as_str()))
    }
}

/// Classifies a response.
///
/// Returns `None` for responses that are skipped before parsing (non-`POST`,
/// excluded URL) and for bodies that are not valid JSON.
pub fn classify(rules: &ObserverRules, response: &NetworkResponse) -> Option<ResponseEvent> {
    if !response.is_post() || rules.is_excluded(&response.url) {
        return None;
    }

    let payload = match response.json() {
        Ok(payload) => payload,
        Err(err) => {
            trace!(target = "egc.observer", url = %response.url, error = %err, "non-JSON response body");
            return None;
        }
    };

    let url = response.url.as_str();
    let field = |name: &str| payload.get(name).is_some_and(is_truthy);

    let kind = if url.contains(&rules.login_marker) && field("errorCode") {
        ResponseKind::LoginError
    } else if url.contains(&rules.analytics_marker) && field("accountId") {
        ResponseKind::AnalyticsSuccess
    } else if url.contains(&rules.csrf_marker) && payload.get("success") == Some(&Value::Bool(true)) {
        ResponseKind::CsrfRefreshed
    } else {
        ResponseKind::Ignored
    };

    Some(ResponseEvent::new(kind, payload))
}

/// JSON truthiness as the storefront's own client applies it.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Publishes login signals derived from classified responses.
#[derive(Debug, Clone)]
pub struct ResponseObserver {
    rules: ObserverRules,
    login_success: SignalSender<LoginSuccessSignal>,
    csrf_refresh: SignalSender<CsrfRefreshSignal>,
}

impl ResponseObserver {
    pub fn new(
        rules: ObserverRules,
        login_success: SignalSender<LoginSuccessSignal>,
        csrf_refresh: SignalSender<CsrfRefreshSignal>,
    ) -> Self {
        Self {
            rules,
            login_success,
            csrf_refresh,
        }
    }

    /// Classifies one response and performs the matching queue write.
    ///
    /// Returns the classification, or `None` when the response was skipped.
    pub fn handle(&self, response: &NetworkResponse) -> Option<ResponseKind> {
        let event = classify(&self.rules, response)?;

        match event.kind {
            ResponseKind::LoginError => {
                let pretty = serde_json::to_string_pretty(&event.raw_payload).unwrap_or_default();
                error!(target = "egc.observer", method = %response.method, url = %response.url, payload = %pretty, "login endpoint returned an error");
            }
            ResponseKind::AnalyticsSuccess => match LoginSuccessSignal::from_payload(event.raw_payload) {
                Some(signal) => {
                    debug!(target = "egc.observer", account_id = %signal.account_id, "login success observed");
                    self.login_success.send(signal);
                }
                None => return Some(ResponseKind::Ignored),
            },
            ResponseKind::CsrfRefreshed => {
                debug!(target = "egc.observer", url = %response.url, "csrf refresh observed");
                self.csrf_refresh.send(CsrfRefreshSignal {
                    payload: event.raw_payload,
                });
            }
            ResponseKind::Ignored => {}
        }

        Some(event.kind)
    }

    /// Runs the observer on its own task until the subscription ends or the
    /// returned handle is dropped.
    pub fn spawn(self, mut subscription: ResponseSubscription) -> ObserverHandle {
        let task = tokio::spawn(async move {
            while let Some(response) = subscription.next().await {
                self.handle(&response);
            }
            trace!(target = "egc.observer", "response stream ended");
        });
        ObserverHandle { task }
    }
}

/// Keeps an observer task alive; aborts it (and unsubscribes) on drop.
#[derive(Debug)]
pub struct ObserverHandle {
    task: JoinHandle<()>,
}

impl Drop for ObserverHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

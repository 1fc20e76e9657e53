//! Network responses observed on the browser session.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A completed network response as surfaced by the session's response stream.
///
/// The body is kept as raw bytes: most responses on a storefront page are
/// not JSON and classification must be able to reject them cheaply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkResponse {
    /// HTTP method of the originating request (`"POST"`, `"GET"`, ...).
    pub method: String,
    /// Fully qualified request URL.
    pub url: String,
    /// Raw response body.
    #[serde(default)]
    pub body: Vec<u8>,
}

impl NetworkResponse {
    pub fn new(method: impl Into<String>, url: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            body: body.into(),
        }
    }

    /// Convenience constructor for a `POST` response carrying a JSON body.
    pub fn post_json(url: impl Into<String>, body: &Value) -> Self {
        Self::new("POST", url, body.to_string().into_bytes())
    }

    pub fn is_post(&self) -> bool {
        self.method.eq_ignore_ascii_case("POST")
    }

    /// Parses the body as JSON.
    pub fn json(&self) -> serde_json::Result<Value> {
        serde_json::from_slice(&self.body)
    }
}

/// Classification assigned to a network response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseKind {
    /// The login endpoint answered with an error code.
    LoginError,
    /// The identity analytics endpoint reported an account id.
    AnalyticsSuccess,
    /// The CSRF refresh endpoint answered `success: true`.
    CsrfRefreshed,
    /// Anything else.
    Ignored,
}

/// A classified network response. Transient: never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEvent {
    pub kind: ResponseKind,
    pub raw_payload: Value,
}

impl ResponseEvent {
    pub fn new(kind: ResponseKind, raw_payload: Value) -> Self {
        Self { kind, raw_payload }
    }
}

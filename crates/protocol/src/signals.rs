//! Typed signals published by the response observer.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Published when the identity analytics endpoint reports an account id,
/// which only happens once the sign-in has been accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginSuccessSignal {
    pub account_id: String,
    pub payload: Value,
}

impl LoginSuccessSignal {
    /// Builds the signal from an analytics payload.
    ///
    /// Returns `None` when the payload carries no `accountId`.
    pub fn from_payload(payload: Value) -> Option<Self> {
        let account_id = match payload.get("accountId")? {
            Value::String(s) => s.clone(),
            Value::Null => return None,
            other => other.to_string(),
        };
        Some(Self { account_id, payload })
    }
}

/// Published when the account service refreshed its CSRF token, which marks
/// the end of the post-login account validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsrfRefreshSignal {
    pub payload: Value,
}

//! Telegram Bot API payloads for `sendMessage`.

use serde::{Deserialize, Serialize};

/// Text formatting mode accepted by `sendMessage`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParseMode {
    #[serde(rename = "HTML")]
    Html,
}

/// Request body for `POST /bot{token}/sendMessage`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub chat_id: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<ParseMode>,
    /// Forum topic to post into, for chats with topics enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_thread_id: Option<i64>,
}

impl SendMessageRequest {
    pub fn html(chat_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            text: text.into(),
            parse_mode: Some(ParseMode::Html),
            message_thread_id: None,
        }
    }

    pub fn with_thread(mut self, thread_id: Option<i64>) -> Self {
        self.message_thread_id = thread_id;
        self
    }
}

/// Envelope returned by every Bot API method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelegramResponse {
    pub ok: bool,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub error_code: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn thread_id_is_omitted_when_absent() {
        let body = serde_json::to_value(SendMessageRequest::html("42", "hi")).unwrap();
        assert_eq!(body, json!({"chat_id": "42", "text": "hi", "parse_mode": "HTML"}));
    }

    #[test]
    fn thread_id_is_serialized_as_number() {
        let body = serde_json::to_value(SendMessageRequest::html("42", "hi").with_thread(Some(7))).unwrap();
        assert_eq!(body["message_thread_id"], json!(7));
    }
}

//! Best-effort outbound notifications.
//!
//! Every method performs at most one delivery attempt and reports whether it
//! went through. Transport failures are logged and swallowed; they never
//! affect the login outcome.

use std::time::Duration;

use async_trait::async_trait;
use egc_protocol::{SendMessageRequest, TelegramResponse};
use tracing::{debug, warn};

use crate::config::TelegramSettings;

/// Timeout for a single Bot API request.
pub const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Destination for login and claim notifications.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify_login_failed(&self, account: &str, error: &str) -> bool;

    async fn notify_game_claimed(&self, title: &str, success: bool, url: Option<&str>) -> bool;

    async fn notify_games_summary(&self, claimed: &[String], failed: &[String]) -> bool;
}

/// Telegram Bot API sink.
///
/// Built once from settings; when the bot token or chat id is missing the
/// notifier is [`TelegramNotifier::Disabled`] and every call is a no-op
/// returning `false`.
#[derive(Debug, Clone)]
pub enum TelegramNotifier {
    Disabled,
    Enabled(TelegramClient),
}

/// Configured Bot API endpoint.
#[derive(Debug, Clone)]
pub struct TelegramClient {
    http: reqwest::Client,
    endpoint: String,
    chat_id: String,
    message_thread_id: Option<i64>,
}

impl TelegramNotifier {
    pub fn from_settings(settings: &TelegramSettings) -> Self {
        let (Some(token), Some(chat_id)) = (settings.bot_token.as_ref(), settings.chat_id.as_ref()) else {
            return Self::Disabled;
        };
        if !settings.is_enabled() {
            return Self::Disabled;
        }

        let http = match reqwest::Client::builder().timeout(SEND_TIMEOUT).build() {
            Ok(http) => http,
            Err(err) => {
                warn!(target = "egc.notify", error = %err, "failed to build HTTP client, notifications disabled");
                return Self::Disabled;
            }
        };

        let base = settings.api_base_url.trim_end_matches('/');
        Self::Enabled(TelegramClient {
            http,
            endpoint: format!("{base}/bot{}/sendMessage", token.expose()),
            chat_id: chat_id.clone(),
            message_thread_id: settings.message_thread_id,
        })
    }

    pub fn disabled() -> Self {
        Self::Disabled
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::Enabled(_))
    }

    /// Sends `text` as an HTML message.
    pub async fn send_message(&self, text: &str) -> bool {
        let client = match self {
            Self::Disabled => {
                debug!(target = "egc.notify", "telegram notification disabled (missing bot token or chat id)");
                return false;
            }
            Self::Enabled(client) => client,
        };

        let request = SendMessageRequest::html(client.chat_id.clone(), text).with_thread(client.message_thread_id);

        let response = match client.http.post(&client.endpoint).json(&request).send().await {
            Ok(response) => response,
            Err(err) => {
                // reqwest includes the URL, which carries the bot token.
                warn!(target = "egc.notify", error = %err.without_url(), "failed to send telegram notification");
                return false;
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!(target = "egc.notify", %status, "telegram rejected notification");
            return false;
        }

        match response.json::<TelegramResponse>().await {
            Ok(TelegramResponse { ok: false, description, .. }) => {
                warn!(target = "egc.notify", description = description.as_deref().unwrap_or(""), "telegram rejected notification");
                false
            }
            _ => {
                debug!(target = "egc.notify", "telegram notification sent");
                true
            }
        }
    }
}

#[async_trait]
impl NotificationSink for TelegramNotifier {
    async fn notify_login_failed(&self, account: &str, error: &str) -> bool {
        self.send_message(&login_failed_message(account, error)).await
    }

    async fn notify_game_claimed(&self, title: &str, success: bool, url: Option<&str>) -> bool {
        self.send_message(&game_claimed_message(title, success, url)).await
    }

    async fn notify_games_summary(&self, claimed: &[String], failed: &[String]) -> bool {
        self.send_message(&games_summary_message(claimed, failed)).await
    }
}

pub fn login_failed_message(account: &str, error: &str) -> String {
    let mut text = String::from("🚫 <b>Epic Games login failed</b>\n\n");
    text.push_str(&format!("Account: <code>{}</code>\n", escape_html(account)));
    if !error.is_empty() {
        text.push_str(&format!("Error: {}\n", escape_html(error)));
    }
    text
}

pub fn game_claimed_message(title: &str, success: bool, url: Option<&str>) -> String {
    let (header, status) = if success {
        ("🎉 <b>Game claimed</b>", "✅ claimed")
    } else {
        ("⚠️ <b>Game claim failed</b>", "❌ not claimed")
    };

    let mut text = format!("{header}\n\n");
    text.push_str(&format!("Game: <b>{}</b>\n", escape_html(title)));
    text.push_str(&format!("Status: {status}\n"));
    if let Some(url) = url.filter(|u| !u.is_empty()) {
        text.push_str(&format!("Link: {}\n", escape_html(url)));
    }
    text
}

pub fn games_summary_message(claimed: &[String], failed: &[String]) -> String {
    let mut text = String::from("📊 <b>Epic Games claim summary</b>\n\n");

    let mut section = |icon: &str, label: &str, games: &[String]| {
        if games.is_empty() {
            return;
        }
        text.push_str(&format!("{icon} <b>{label} ({}):</b>\n", games.len()));
        for game in games {
            text.push_str(&format!("  • {}\n", escape_html(game)));
        }
        text.push('\n');
    };
    section("✅", "Claimed", claimed);
    section("❌", "Failed", failed);

    if claimed.is_empty() && failed.is_empty() {
        text.push_str("ℹ️ All free games of the week are already in the library\n");
    }
    text
}

fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

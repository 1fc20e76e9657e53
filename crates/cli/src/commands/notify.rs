use anyhow::Result;
use egc::{NotificationSink, Settings, TelegramNotifier};
use tracing::{info, warn};

use crate::cli::NotifyAction;

/// Sends one notification through `sink` and reports delivery.
pub async fn send(sink: &dyn NotificationSink, settings: &Settings, action: NotifyAction) -> bool {
    match action {
        NotifyAction::Claimed { title, url, failed } => {
            sink.notify_game_claimed(&title, !failed, url.as_deref()).await
        }
        NotifyAction::Summary { claimed, failed } => sink.notify_games_summary(&claimed, &failed).await,
        NotifyAction::LoginFailed { error } => {
            sink.notify_login_failed(&settings.credentials.email, &error).await
        }
    }
}

pub async fn execute(settings: &Settings, action: NotifyAction) -> Result<bool> {
    let notifier = TelegramNotifier::from_settings(&settings.telegram);
    if !notifier.is_enabled() {
        warn!(target = "egc", "telegram is not configured (TG_BOT_TOKEN, TG_CHAT_ID)");
    }

    let delivered = send(&notifier, settings, action).await;
    if delivered {
        info!(target = "egc", "notification delivered");
    } else {
        eprintln!("notification was not delivered");
    }
    Ok(delivered)
}

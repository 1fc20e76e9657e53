use anyhow::Result;
use egc::Settings;
use tracing::info;

/// Pretty JSON with secrets masked.
pub fn render_settings(settings: &Settings) -> Result<String> {
    Ok(serde_json::to_string_pretty(settings)?)
}

pub fn execute(settings: &Settings) -> Result<bool> {
    if let Err(err) = settings.validate() {
        info!(target = "egc", error = %err, "settings are incomplete for a login run");
    }
    println!("{}", render_settings(settings)?);
    Ok(true)
}

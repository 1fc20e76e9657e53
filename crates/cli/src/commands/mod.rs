mod config;
mod notify;
mod otp;

use std::path::Path;

use anyhow::Result;
use egc::Settings;

use crate::cli::Commands;

pub use config::render_settings;
pub use notify::send;
pub use otp::{OtpReport, otp_report};

/// Runs one command. `Ok(false)` means the command ran but did not succeed
/// (a notification that was not delivered).
pub async fn dispatch(command: Commands, config: Option<&Path>) -> Result<bool> {
    let settings = Settings::load(config)?;

    match command {
        Commands::Config => config::execute(&settings),
        Commands::Otp { at } => otp::execute(&settings, at),
        Commands::Notify { action } => notify::execute(&settings, action).await,
    }
}

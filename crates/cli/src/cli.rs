use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "egc")]
#[command(about = "Epic Games claimer - login settings, TOTP codes and notifications")]
#[command(version)]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Settings file (JSON); environment variables are applied on top
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print resolved settings as JSON (secrets redacted)
    Config,

    /// Print the current TOTP code for the configured secret
    Otp {
        /// Compute the code for this Unix timestamp instead of now
        #[arg(long, value_name = "UNIX_SECONDS")]
        at: Option<u64>,
    },

    /// Send a notification through the configured Telegram chat
    Notify {
        #[command(subcommand)]
        action: NotifyAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum NotifyAction {
    /// Report a single claimed (or failed) game
    Claimed {
        #[arg(long)]
        title: String,
        /// Store page of the game
        #[arg(long)]
        url: Option<String>,
        /// Report the claim as failed
        #[arg(long)]
        failed: bool,
    },

    /// Report the outcome of a whole claim run
    Summary {
        /// Claimed game title (repeatable)
        #[arg(long = "claimed", value_name = "TITLE")]
        claimed: Vec<String>,
        /// Failed game title (repeatable)
        #[arg(long = "failed", value_name = "TITLE")]
        failed: Vec<String>,
    },

    /// Report a login failure for the configured account
    LoginFailed {
        #[arg(long, default_value = "manual test notification")]
        error: String,
    },
}

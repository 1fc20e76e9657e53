//! Read-only configuration for the login journey.
//!
//! Settings are resolved once, from an optional JSON file overlaid with
//! environment variables, and then shared immutably (`Arc<Settings>`) by the
//! controller, the login flow and the notifier.
//!
//! | variable | field |
//! |----------|-------|
//! | `EPIC_EMAIL` | `credentials.email` |
//! | `EPIC_PASSWORD` | `credentials.password` |
//! | `EPIC_TOTP_SECRET` | `credentials.totp_secret` |
//! | `SCREENSHOTS_DIR` | `screenshots_dir` |
//! | `TG_BOT_TOKEN` | `telegram.bot_token` |
//! | `TG_CHAT_ID` | `telegram.chat_id` |
//! | `TG_MESSAGE_THREAD_ID` | `telegram.message_thread_id` |
//! | `TG_API_BASE_URL` | `telegram.api_base_url` |
//!
//! Empty values count as absent.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};
use crate::observer::ObserverRules;

const REDACTED: &str = "***";

/// A string that never shows up in logs or serialized output.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the secret value. Callers must not log the result.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret({REDACTED})")
    }
}

impl Serialize for Secret {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(if self.0.is_empty() { "" } else { REDACTED })
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Blank secrets in a settings file count as absent.
fn optional_secret<'de, D>(deserializer: D) -> std::result::Result<Option<Secret>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Secret>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.expose().trim().is_empty()))
}

/// Account credentials. Supplied externally and never mutated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub email: String,
    pub password: Secret,
    /// Base32 TOTP seed; enables the one-time-password step when present.
    #[serde(deserialize_with = "optional_secret")]
    pub totp_secret: Option<Secret>,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: Secret::new(password),
            totp_secret: None,
        }
    }

    pub fn with_totp_secret(mut self, secret: impl Into<String>) -> Self {
        self.totp_secret = Some(Secret::new(secret)).filter(|s| !s.is_empty());
        self
    }
}

/// Telegram destination for notifications.
///
/// Notifications are enabled only when both `bot_token` and `chat_id` are set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramSettings {
    pub bot_token: Option<Secret>,
    pub chat_id: Option<String>,
    pub message_thread_id: Option<i64>,
    pub api_base_url: String,
}

impl Default for TelegramSettings {
    fn default() -> Self {
        Self {
            bot_token: None,
            chat_id: None,
            message_thread_id: None,
            api_base_url: "https://api.telegram.org".to_string(),
        }
    }
}

impl TelegramSettings {
    pub fn is_enabled(&self) -> bool {
        self.bot_token.as_ref().is_some_and(|t| !t.is_empty())
            && self.chat_id.as_deref().is_some_and(|c| !c.is_empty())
    }
}

/// URLs and selectors of the storefront.
///
/// Kept apart from the flow logic so UI changes on the storefront only touch
/// configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Page the controller opens to check the authenticated state.
    pub claim_url: String,
    /// Account page that forces a fresh sign-in.
    pub login_url: String,
    /// Account page visited for post-login validation.
    pub account_url: String,
    /// Element carrying the authenticated-state attribute.
    pub logged_in_marker: String,
    pub logged_in_attribute: String,
    pub email_input: String,
    pub continue_button: String,
    pub password_input: String,
    pub sign_in_button: String,
    /// One-time-password cell selector; `{index}` is replaced by 0..=5.
    pub otp_cell_template: String,
    /// Optional prompts shown after sign-in, dismissed in this order.
    pub validation_prompts: Vec<String>,
    pub observer: ObserverRules,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            claim_url: "https://store.epicgames.com/en-US/free-games".to_string(),
            login_url: "https://www.epicgames.com/account/personal?lang=en-US&productName=egs&sessionInvalidated=true"
                .to_string(),
            account_url: "https://www.epicgames.com/account/personal".to_string(),
            logged_in_marker: "//egs-navigation".to_string(),
            logged_in_attribute: "isloggedin".to_string(),
            email_input: "#email".to_string(),
            continue_button: "#continue".to_string(),
            password_input: "#password".to_string(),
            sign_in_button: "#sign-in".to_string(),
            otp_cell_template: r#"input[name="code-input-{index}"]"#.to_string(),
            validation_prompts: vec![
                "#link-success".to_string(),
                "#login-reminder-prompt-setup-tfa-skip".to_string(),
                "#yes".to_string(),
            ],
            observer: ObserverRules::default(),
        }
    }
}

impl SiteConfig {
    /// Selector of the one-time-password cell at `index`.
    pub fn otp_cell(&self, index: usize) -> String {
        self.otp_cell_template.replace("{index}", &index.to_string())
    }
}

/// Fully resolved settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub credentials: Credentials,
    /// Root directory for failure screenshots.
    pub screenshots_dir: PathBuf,
    pub telegram: TelegramSettings,
    pub site: SiteConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            credentials: Credentials::default(),
            screenshots_dir: PathBuf::from("screenshots"),
            telegram: TelegramSettings::default(),
            site: SiteConfig::default(),
        }
    }
}

impl Settings {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            ..Default::default()
        }
    }

    /// Loads settings from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;
        serde_json::from_str(&raw).map_err(|e| Error::Config(format!("invalid settings file {}: {e}", path.display())))
    }

    /// Loads settings from the process environment only.
    pub fn from_env() -> Result<Self> {
        let mut settings = Self::default();
        settings.apply_env(|key| std::env::var(key).ok())?;
        Ok(settings)
    }

    /// Loads the optional file, then lets environment variables override it.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        settings.apply_env(|key| std::env::var(key).ok())?;
        Ok(settings)
    }

    /// Overlays values returned by `lookup`. Empty values are skipped.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        // Secrets are taken verbatim; surrounding whitespace may be part of them.
        let get_secret = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(email) = get("EPIC_EMAIL") {
            self.credentials.email = email;
        }
        if let Some(password) = get_secret("EPIC_PASSWORD") {
            self.credentials.password = Secret::new(password);
        }
        if let Some(seed) = get_secret("EPIC_TOTP_SECRET").filter(|v| !v.trim().is_empty()) {
            self.credentials.totp_secret = Some(Secret::new(seed));
        }
        if let Some(dir) = get("SCREENSHOTS_DIR") {
            self.screenshots_dir = PathBuf::from(dir);
        }
        if let Some(token) = get_secret("TG_BOT_TOKEN") {
            self.telegram.bot_token = Some(Secret::new(token));
        }
        if let Some(chat_id) = get("TG_CHAT_ID") {
            self.telegram.chat_id = Some(chat_id);
        }
        if let Some(thread) = get("TG_MESSAGE_THREAD_ID") {
            let id = thread
                .parse::<i64>()
                .map_err(|_| Error::Config(format!("TG_MESSAGE_THREAD_ID must be an integer, got {thread:?}")))?;
            self.telegram.message_thread_id = Some(id);
        }
        if let Some(base) = get("TG_API_BASE_URL") {
            self.telegram.api_base_url = base.trim_end_matches('/').to_string();
        }
        Ok(())
    }

    /// Checks that the values required for a login attempt are present.
    pub fn validate(&self) -> Result<()> {
        if self.credentials.email.trim().is_empty() {
            return Err(Error::Config("account email is not configured (EPIC_EMAIL)".into()));
        }
        if self.credentials.password.is_empty() {
            return Err(Error::Config("account password is not configured (EPIC_PASSWORD)".into()));
        }
        Ok(())
    }

    /// Directory that receives failed-login screenshots.
    pub fn authorization_screenshots_dir(&self) -> PathBuf {
        self.screenshots_dir.join("authorization")
    }
}

// egc: login orchestration for an automated storefront session
//
// The browser engine, the challenge solver and the notification transport
// are capabilities injected by the caller; this crate coordinates them.

pub mod assertions;
pub mod challenge;
pub mod config;
pub mod controller;
pub mod error;
pub mod fake_session;
pub mod login;
pub mod notify;
pub mod observer;
pub mod session;
pub mod signal;
pub mod totp;

pub use assertions::expect;
pub use challenge::{ChallengeResolver, NoChallenge};
pub use config::{Credentials, Secret, Settings, SiteConfig, TelegramSettings};
pub use controller::{ClaimFlowController, MAX_AUTH_CHECK_FAILURES, MAX_LOGIN_ATTEMPTS};
pub use error::{Error, Result};
pub use login::{AttemptOutcome, LoginFlow, LoginState, LoginTimings};
pub use notify::{NotificationSink, TelegramNotifier};
pub use observer::{ObserverHandle, ObserverRules, ResponseObserver, classify};
pub use session::{ResponseHub, ResponseSubscription, Session, WaitUntil};
pub use signal::{SignalReceiver, SignalSender, signal_queue};
pub use totp::Totp;

pub use egc_protocol as protocol;

//! Browser session capability consumed by the login flow.
//!
//! The browser engine itself is not part of this crate. Anything that can
//! navigate, query elements, type, click, take screenshots and stream
//! completed network responses can drive the journey by implementing
//! [`Session`]. Implementors fan responses out to subscribers through a
//! [`ResponseHub`].

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use egc_protocol::NetworkResponse;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::error::Result;

/// Navigation completion condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaitUntil {
    Load,
    #[default]
    DomContentLoaded,
    NetworkIdle,
    Commit,
}

impl WaitUntil {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::DomContentLoaded => "domcontentloaded",
            Self::NetworkIdle => "networkidle",
            Self::Commit => "commit",
        }
    }
}

/// The single page under automation.
///
/// Selectors use the engine's selector syntax (CSS, or XPath when prefixed
/// with `//`). Element operations fail with
/// [`Error::ElementNotFound`](crate::Error::ElementNotFound) when nothing
/// matches.
#[async_trait]
pub trait Session: Send + Sync {
    async fn goto(&self, url: &str, wait_until: WaitUntil) -> Result<()>;

    /// Reports whether `selector` currently matches a visible element.
    async fn is_visible(&self, selector: &str) -> Result<bool>;

    async fn clear(&self, selector: &str) -> Result<()>;

    /// Types `text` key by key, as a user would.
    async fn type_text(&self, selector: &str, text: &str) -> Result<()>;

    /// Replaces the value of an input in one step.
    async fn fill(&self, selector: &str, text: &str) -> Result<()>;

    async fn click(&self, selector: &str, timeout: Option<Duration>) -> Result<()>;

    async fn get_attribute(&self, selector: &str, name: &str) -> Result<Option<String>>;

    /// Writes a PNG screenshot of the page to `path`.
    async fn screenshot(&self, path: &Path) -> Result<()>;

    /// Opens a new stream of every completed network response.
    ///
    /// Dropping the returned subscription unsubscribes.
    fn subscribe_responses(&self) -> ResponseSubscription;
}

/// Receiving end of a response stream.
#[derive(Debug)]
pub struct ResponseSubscription {
    rx: mpsc::UnboundedReceiver<NetworkResponse>,
}

impl ResponseSubscription {
    /// Returns the next response, or `None` once the session stopped publishing.
    pub async fn next(&mut self) -> Option<NetworkResponse> {
        self.rx.recv().await
    }
}

/// Fan-out of network responses to any number of subscribers.
#[derive(Debug, Default)]
pub struct ResponseHub {
    subscribers: Mutex<Vec<mpsc::UnboundedSender<NetworkResponse>>>,
}

impl ResponseHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> ResponseSubscription {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().push(tx);
        ResponseSubscription { rx }
    }

    /// Delivers `response` to every live subscriber and forgets dropped ones.
    pub fn publish(&self, response: NetworkResponse) {
        self.subscribers.lock().retain(|tx| tx.send(response.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|tx| !tx.is_closed());
        subscribers.len()
    }
}

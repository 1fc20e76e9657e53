//! In-memory session for exercising the login flow without a browser.
//!
//! The fake keeps a table of elements (visibility, value, attributes),
//! records every action it receives, and can publish scripted network
//! responses when a selector is clicked or a URL is opened.
//!
//! # Example
//!
//! ```ignore
//! let (session, controller) = FakeSessionBuilder::new()
//!     .element("#email")
//!     .element("#sign-in")
//!     .build();
//!
//! controller.on_click("#sign-in", Duration::from_millis(20), analytics_response());
//! let flow = LoginFlow::new(session, settings);
//! flow.attempt_login().await;
//!
//! assert_eq!(controller.clicks("#sign-in"), 1);
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use egc_protocol::NetworkResponse;
use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::session::{ResponseHub, ResponseSubscription, Session, WaitUntil};

/// Bytes written by [`FakeSession::screenshot`]: a PNG signature.
pub const FAKE_SCREENSHOT_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n";

/// An action received by the fake session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Goto { url: String, wait_until: WaitUntil },
    Clear { selector: String },
    Type { selector: String, text: String },
    Fill { selector: String, text: String },
    Click { selector: String },
    Screenshot { path: PathBuf },
}

#[derive(Debug, Clone, Default)]
struct FakeElement {
    visible: bool,
    value: String,
    attributes: HashMap<String, String>,
}

#[derive(Debug, Clone)]
struct ScriptedResponse {
    delay: Duration,
    response: NetworkResponse,
}

#[derive(Debug, Default)]
struct State {
    elements: HashMap<String, FakeElement>,
    actions: Vec<Action>,
    on_click: HashMap<String, Vec<ScriptedResponse>>,
    on_goto: Vec<(String, ScriptedResponse)>,
    failing_urls: Vec<String>,
}

#[derive(Debug, Default)]
struct Inner {
    hub: ResponseHub,
    state: Mutex<State>,
}

impl Inner {
    fn record(&self, action: Action) {
        self.state.lock().actions.push(action);
    }

    fn with_element<T>(&self, selector: &str, f: impl FnOnce(&mut FakeElement) -> T) -> Result<T> {
        let mut state = self.state.lock();
        let element = state.elements.get_mut(selector).ok_or_else(|| Error::ElementNotFound {
            selector: selector.to_string(),
        })?;
        Ok(f(element))
    }

    fn schedule(self: &Arc<Self>, scripted: Vec<ScriptedResponse>) {
        for ScriptedResponse { delay, response } in scripted {
            if delay.is_zero() {
                self.hub.publish(response);
                continue;
            }
            let inner = Arc::clone(self);
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                inner.hub.publish(response);
            });
        }
    }
}

/// Builder for [`FakeSession`] instances.
#[derive(Default)]
pub struct FakeSessionBuilder {
    elements: HashMap<String, FakeElement>,
}

impl FakeSessionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a visible element.
    pub fn element(mut self, selector: &str) -> Self {
        self.elements.insert(
            selector.to_string(),
            FakeElement {
                visible: true,
                ..Default::default()
            },
        );
        self
    }

    /// Adds an element that exists but is not visible.
    pub fn hidden_element(mut self, selector: &str) -> Self {
        self.elements.insert(selector.to_string(), FakeElement::default());
        self
    }

    /// Adds a visible element carrying one attribute.
    pub fn attribute(mut self, selector: &str, name: &str, value: &str) -> Self {
        self.elements
            .entry(selector.to_string())
            .or_insert_with(|| FakeElement {
                visible: true,
                ..Default::default()
            })
            .attributes
            .insert(name.to_string(), value.to_string());
        self
    }

    /// Builds the session and the controller that scripts and inspects it.
    pub fn build(self) -> (Arc<FakeSession>, FakeSessionController) {
        let inner = Arc::new(Inner {
            hub: ResponseHub::new(),
            state: Mutex::new(State {
                elements: self.elements,
                ..Default::default()
            }),
        });
        let session = Arc::new(FakeSession {
            inner: Arc::clone(&inner),
        });
        (session, FakeSessionController { inner })
    }
}

/// The fake [`Session`].
#[derive(Debug)]
pub struct FakeSession {
    inner: Arc<Inner>,
}

#[async_trait]
impl Session for FakeSession {
    async fn goto(&self, url: &str, wait_until: WaitUntil) -> Result<()> {
        self.inner.record(Action::Goto {
            url: url.to_string(),
            wait_until,
        });

        let scripted = {
            let state = self.inner.state.lock();
            if state.failing_urls.iter().any(|u| u == url) {
                return Err(Error::Navigation {
                    url: url.to_string(),
                    message: "net::ERR_CONNECTION_RESET".to_string(),
                });
            }
            state
                .on_goto
                .iter()
                .filter(|(target, _)| target == url)
                .map(|(_, scripted)| scripted.clone())
                .collect::<Vec<_>>()
        };
        self.inner.schedule(scripted);
        Ok(())
    }

    async fn is_visible(&self, selector: &str) -> Result<bool> {
        let state = self.inner.state.lock();
        Ok(state.elements.get(selector).is_some_and(|e| e.visible))
    }

    async fn clear(&self, selector: &str) -> Result<()> {
        self.inner.with_element(selector, |e| e.value.clear())?;
        self.inner.record(Action::Clear {
            selector: selector.to_string(),
        });
        Ok(())
    }

    async fn type_text(&self, selector: &str, text: &str) -> Result<()> {
        self.inner.with_element(selector, |e| e.value.push_str(text))?;
        self.inner.record(Action::Type {
            selector: selector.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn fill(&self, selector: &str, text: &str) -> Result<()> {
        self.inner.with_element(selector, |e| e.value = text.to_string())?;
        self.inner.record(Action::Fill {
            selector: selector.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn click(&self, selector: &str, _timeout: Option<Duration>) -> Result<()> {
        let visible = self.inner.with_element(selector, |e| e.visible)?;
        if !visible {
            return Err(Error::ElementNotVisible {
                selector: selector.to_string(),
                timeout: Duration::ZERO,
            });
        }
        self.inner.record(Action::Click {
            selector: selector.to_string(),
        });

        let scripted = self
            .inner
            .state
            .lock()
            .on_click
            .get(selector)
            .cloned()
            .unwrap_or_default();
        self.inner.schedule(scripted);
        Ok(())
    }

    async fn get_attribute(&self, selector: &str, name: &str) -> Result<Option<String>> {
        self.inner
            .with_element(selector, |e| e.attributes.get(name).cloned())
    }

    async fn screenshot(&self, path: &Path) -> Result<()> {
        std::fs::write(path, FAKE_SCREENSHOT_BYTES)?;
        self.inner.record(Action::Screenshot {
            path: path.to_path_buf(),
        });
        Ok(())
    }

    fn subscribe_responses(&self) -> ResponseSubscription {
        self.inner.hub.subscribe()
    }
}

/// Scripts and inspects a [`FakeSession`].
#[derive(Debug, Clone)]
pub struct FakeSessionController {
    inner: Arc<Inner>,
}

impl FakeSessionController {
    /// Publishes a response to current subscribers immediately.
    pub fn publish(&self, response: NetworkResponse) {
        self.inner.hub.publish(response);
    }

    /// Publishes `response` `delay` after every click on `selector`.
    pub fn on_click(&self, selector: &str, delay: Duration, response: NetworkResponse) {
        self.inner
            .state
            .lock()
            .on_click
            .entry(selector.to_string())
            .or_default()
            .push(ScriptedResponse { delay, response });
    }

    /// Publishes `response` `delay` after every navigation to exactly `url`.
    pub fn on_goto(&self, url: &str, delay: Duration, response: NetworkResponse) {
        self.inner
            .state
            .lock()
            .on_goto
            .push((url.to_string(), ScriptedResponse { delay, response }));
    }

    /// Makes navigation to exactly `url` fail.
    pub fn fail_navigation(&self, url: &str) {
        self.inner.state.lock().failing_urls.push(url.to_string());
    }

    pub fn set_visible(&self, selector: &str, visible: bool) {
        self.inner
            .state
            .lock()
            .elements
            .entry(selector.to_string())
            .or_default()
            .visible = visible;
    }

    pub fn set_attribute(&self, selector: &str, name: &str, value: &str) {
        self.inner
            .state
            .lock()
            .elements
            .entry(selector.to_string())
            .or_default()
            .attributes
            .insert(name.to_string(), value.to_string());
    }

    /// Current value of an input.
    pub fn value(&self, selector: &str) -> Option<String> {
        self.inner
            .state
            .lock()
            .elements
            .get(selector)
            .map(|e| e.value.clone())
    }

    pub fn actions(&self) -> Vec<Action> {
        self.inner.state.lock().actions.clone()
    }

    pub fn clicks(&self, selector: &str) -> usize {
        self.count(|a| matches!(a, Action::Click { selector: s } if s == selector))
    }

    pub fn gotos(&self, url_prefix: &str) -> usize {
        self.count(|a| matches!(a, Action::Goto { url, .. } if url.starts_with(url_prefix)))
    }

    /// Text filled into `selector`, in order.
    pub fn fills(&self, selector: &str) -> Vec<String> {
        self.actions()
            .into_iter()
            .filter_map(|a| match a {
                Action::Fill { selector: s, text } if s == selector => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn screenshots(&self) -> Vec<PathBuf> {
        self.actions()
            .into_iter()
            .filter_map(|a| match a {
                Action::Screenshot { path } => Some(path),
                _ => None,
            })
            .collect()
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.hub.subscriber_count()
    }

    fn count(&self, pred: impl Fn(&Action) -> bool) -> usize {
        self.inner.state.lock().actions.iter().filter(|a| pred(a)).count()
    }
}

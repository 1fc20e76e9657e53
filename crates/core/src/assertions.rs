// Assertions - auto-retry visibility checks over a Session
//
// Playwright-style expect() for the selectors the login flow waits on.

use std::time::Duration;

use tokio::time::Instant;

use crate::error::{Error, Result};
use crate::session::Session;

/// Default timeout for assertions (5 seconds, matching Playwright)
const DEFAULT_ASSERTION_TIMEOUT: Duration = Duration::from_secs(5);

/// Polling interval for assertions (100ms)
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Creates an expectation for `selector` with auto-retry behavior.
///
/// Assertions retry until they pass or time out (default: 5 seconds).
///
/// ```ignore
/// expect(&*session, "#email")
///     .with_timeout(Duration::from_secs(15))
///     .to_be_visible()
///     .await?;
/// ```
pub fn expect<'a>(session: &'a dyn Session, selector: &'a str) -> Expectation<'a> {
    Expectation::new(session, selector)
}

/// Expectation wraps a selector and polls it until the assertion holds.
pub struct Expectation<'a> {
    session: &'a dyn Session,
    selector: &'a str,
    timeout: Duration,
}

impl<'a> Expectation<'a> {
    pub(crate) fn new(session: &'a dyn Session, selector: &'a str) -> Self {
        Self {
            session,
            selector,
            timeout: DEFAULT_ASSERTION_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Asserts that the element is visible.
    ///
    /// A failing visibility query counts as "not visible" and is retried.
    pub async fn to_be_visible(self) -> Result<()> {
        let start = Instant::now();

        loop {
            if self.session.is_visible(self.selector).await.unwrap_or(false) {
                return Ok(());
            }

            if start.elapsed() >= self.timeout {
                return Err(Error::ElementNotVisible {
                    selector: self.selector.to_string(),
                    timeout: self.timeout,
                });
            }

            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}

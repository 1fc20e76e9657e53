//! Single-consumer signal queues between the observer and the login flow.
//!
//! Each login attempt creates fresh queues with [`signal_queue`], so a signal
//! left over from an earlier attempt can never satisfy a later one.

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::trace;

use crate::error::{Error, Result};

/// Creates an unbounded, ordered queue named `name` (used in timeout errors).
pub fn signal_queue<T>(name: &'static str) -> (SignalSender<T>, SignalReceiver<T>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (SignalSender { tx, name }, SignalReceiver { rx, name })
}

/// Producing half. Held by the response observer.
#[derive(Debug)]
pub struct SignalSender<T> {
    tx: mpsc::UnboundedSender<T>,
    name: &'static str,
}

impl<T> Clone for SignalSender<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            name: self.name,
        }
    }
}

impl<T> SignalSender<T> {
    /// Enqueues `value`. Returns `false` when the consumer is gone.
    pub fn send(&self, value: T) -> bool {
        let delivered = self.tx.send(value).is_ok();
        if !delivered {
            trace!(target = "egc.signal", queue = self.name, "consumer dropped, signal discarded");
        }
        delivered
    }
}

/// Consuming half. Owned by exactly one login attempt.
#[derive(Debug)]
pub struct SignalReceiver<T> {
    rx: mpsc::UnboundedReceiver<T>,
    name: &'static str,
}

impl<T> SignalReceiver<T> {
    /// Waits at most `bound` for the next signal.
    ///
    /// Expiry yields [`Error::Timeout`]; a queue whose producers are all gone
    /// yields [`Error::SignalClosed`].
    pub async fn recv_timeout(&mut self, bound: Duration) -> Result<T> {
        match tokio::time::timeout(bound, self.rx.recv()).await {
            Ok(Some(value)) => Ok(value),
            Ok(None) => Err(Error::SignalClosed(self.name)),
            Err(_) => Err(Error::timeout(bound, self.name)),
        }
    }

    /// Waits without bound. Returns `None` once every producer is gone.
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<T> {
        self.rx.try_recv().ok()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }
}

//! User-facing failure notifications (fire-and-forget).

use std::sync::{Arc, Mutex};

use serde::Serialize;
use tokio::sync::broadcast;

/// Catalog of messages shown to the shopper when a cart operation fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Notification {
    AddFailed,
    RemovalFailed,
    AmountChangeFailed,
    QuantityUnavailable,
}

impl Notification {
    pub fn message(self) -> &'static str {
        match self {
            Notification::AddFailed => "add failed",
            Notification::RemovalFailed => "removal failed",
            Notification::AmountChangeFailed => "amount change failed",
            Notification::QuantityUnavailable => "requested quantity unavailable",
        }
    }
}

impl core::fmt::Display for Notification {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.message())
    }
}

/// One-way sink for error messages. Nothing is returned and nothing may fail.
pub trait Notifier: Send + Sync {
    fn notify_error(&self, message: &str);
}

impl<N> Notifier for Arc<N>
where
    N: Notifier + ?Sized,
{
    fn notify_error(&self, message: &str) {
        (**self).notify_error(message)
    }
}

/// Emits notifications as tracing events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify_error(&self, message: &str) {
        tracing::warn!(notification = message, "cart notification");
    }
}

/// Collects notifications in memory (tests/dev).
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .map(|messages| messages.clone())
            .unwrap_or_default()
    }
}

impl Notifier for RecordingNotifier {
    fn notify_error(&self, message: &str) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(message.to_string());
        }
    }
}

/// Fans notifications out to live listeners (lossy; no backpressure on the cart).
#[derive(Debug, Clone)]
pub struct BroadcastNotifier {
    tx: broadcast::Sender<String>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }
}

impl Notifier for BroadcastNotifier {
    fn notify_error(&self, message: &str) {
        tracing::warn!(notification = message, "cart notification");
        // No listeners is fine.
        let _ = self.tx.send(message.to_string());
    }
}

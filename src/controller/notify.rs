use tokio::sync::broadcast;
use tracing::{error, warn};

use crate::errors::ChatError;

const CHANNEL_CAPACITY: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
}

/// A transient user-facing message, separate from controller state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self { level: NotificationLevel::Success, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: NotificationLevel::Error, message: message.into() }
    }
}

#[derive(Clone)]
pub struct Notifier {
    tx: broadcast::Sender<Notification>,
}

impl Notifier {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }

    pub fn success(&self, message: impl Into<String>) {
        self.publish(Notification::success(message));
    }

    /// Logs `err` and publishes it as an error notification.
    pub fn report(&self, context: &str, err: &ChatError) {
        if err.is_validation() {
            warn!("{context}: {err}");
        } else {
            error!("{context}: {err}");
        }
        self.publish(Notification::error(format!("{context}: {err}")));
    }

    fn publish(&self, notification: Notification) {
        // No subscribers is fine; notifications are fire-and-forget.
        let _ = self.tx.send(notification);
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

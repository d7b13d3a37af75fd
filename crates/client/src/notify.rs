//! User-facing notifications (toasts).
//!
//! [`Notifier`] fans each [`Notification`] out over a
//! [`tokio::sync::broadcast`] channel so any view can render it, and logs
//! it through `tracing` so headless callers still see it.

use chrono::Utc;
use serde::Serialize;
use tokio::sync::broadcast;
use wayfarer_core::types::Timestamp;

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Info,
    Error,
}

/// A single message for the user.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub timestamp: Timestamp,
}

/// Cloneable handle for publishing notifications.
#[derive(Clone)]
pub struct Notifier {
    sender: broadcast::Sender<Notification>,
}

impl Notifier {
    /// When the buffer is full, slow receivers observe
    /// `RecvError::Lagged` and skip the oldest messages.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    pub fn success(&self, message: impl Into<String>) {
        self.publish(NotificationLevel::Success, message.into());
    }

    pub fn info(&self, message: impl Into<String>) {
        self.publish(NotificationLevel::Info, message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.publish(NotificationLevel::Error, message.into());
    }

    fn publish(&self, level: NotificationLevel, message: String) {
        match level {
            NotificationLevel::Error => tracing::warn!(%message, "Notify user"),
            _ => tracing::info!(%message, "Notify user"),
        }
        // A send error only means nobody is listening.
        let _ = self.sender.send(Notification {
            level,
            message,
            timestamp: Utc::now(),
        });
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

use tokio::sync::broadcast;

pub const DEFAULT_NOTIFICATION_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
    Warning,
}

/// A transient, dismissable user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Warning,
            message: message.into(),
        }
    }
}

/// Fan-out channel for user-facing notifications.
///
/// Every mutation outcome and load failure is published here; the
/// presentation layer subscribes and renders them as toasts. Publishing
/// with no subscriber is fine, notifications are fire-and-forget.
#[derive(Clone)]
pub struct NotificationHub {
    tx: broadcast::Sender<Notification>,
}

impl NotificationHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }

    pub fn publish(&self, notification: Notification) {
        let _ = self.tx.send(notification);
    }

    pub fn success(&self, message: impl Into<String>) {
        self.publish(Notification::success(message));
    }

    pub fn error(&self, message: impl Into<String>) {
        self.publish(Notification::error(message));
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.publish(Notification::warning(message));
    }
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self::new(DEFAULT_NOTIFICATION_CAPACITY)
    }
}

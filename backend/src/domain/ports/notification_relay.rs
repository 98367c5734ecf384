//! Port for best-effort live notifications.
use async_trait::async_trait;

use crate::domain::Notification;

/// Fans a notification out to every connected viewer.
///
/// Delivery is best-effort: implementations drop sends that fail and never
/// report them to the caller.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationRelay: Send + Sync {
    /// Broadcast one notification.
    async fn broadcast(&self, notification: Notification);
}

/// Relay that discards everything, for processes without viewers.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentRelay;

#[async_trait]
impl NotificationRelay for SilentRelay {
    async fn broadcast(&self, _notification: Notification) {}
}

//! Tokio broadcast bus for user-visible notifications.

use crate::models::{Notification, NotificationLevel};
use tokio::sync::broadcast;

/// Default number of buffered notifications per subscriber.
pub const DEFAULT_NOTIFICATION_CAPACITY: usize = 64;

/// Fan-out channel for [`Notification`]s.
///
/// Publishing never blocks and never fails; with no subscribers the
/// notification is dropped. Slow subscribers lose the oldest entries.
#[derive(Clone)]
pub struct NotificationBus {
    sender: broadcast::Sender<Notification>,
}

impl NotificationBus {
    /// Creates a new bus with the given buffer capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes a notification to all subscribers (best effort).
    pub fn publish(&self, notification: Notification) {
        metrics::counter!(
            "notifications_published_total",
            "level" => notification.level.as_str()
        )
        .increment(1);

        match notification.level {
            NotificationLevel::Error => {
                tracing::error!(source = notification.source, "{}", notification.message);
            },
            NotificationLevel::Warning => {
                tracing::warn!(source = notification.source, "{}", notification.message);
            },
            NotificationLevel::Info | NotificationLevel::Success => {
                tracing::info!(source = notification.source, "{}", notification.message);
            },
        }

        if self.sender.send(notification).is_err() {
            metrics::counter!("notifications_dropped_total").increment(1);
        }
    }

    /// Subscribes to notifications published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    /// Returns the number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::new(DEFAULT_NOTIFICATION_CAPACITY)
    }
}

impl std::fmt::Debug for NotificationBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationBus")
            .field("subscribers", &self.sender.receiver_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribers_receive_in_order() {
        let bus = NotificationBus::default();
        let mut rx = bus.subscribe();

        bus.publish(Notification::info("sync", "first"));
        bus.publish(Notification::error("sync", "second"));

        assert_eq!(rx.recv().await.unwrap().message, "first");
        let second = rx.recv().await.unwrap();
        assert_eq!(second.level, NotificationLevel::Error);
        assert_eq!(second.message, "second");
    }

    #[test]
    fn test_publish_without_subscribers_is_harmless() {
        let bus = NotificationBus::new(0);
        assert_eq!(bus.subscriber_count(), 0);
        bus.publish(Notification::success("import", "nobody listening"));
    }

    #[tokio::test]
    async fn test_clones_share_the_channel() {
        let bus = NotificationBus::default();
        let mut rx = bus.subscribe();
        bus.clone().publish(Notification::warning("store", "shared"));
        assert_eq!(rx.recv().await.unwrap().source, "store");
    }
}

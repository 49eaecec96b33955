//! Page-wide notification hub.
//!
//! Widget instances on the same page coordinate through the hub: when one
//! instance observes a sign-in it publishes an identity change so every
//! instance refreshes its frame with the new session.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::sync::lock;

/// Topics carried by the hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HubTopic {
    UserIdentityChanged,
}

impl HubTopic {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UserIdentityChanged => "user_identity_changed",
        }
    }
}

type Subscriber = Arc<dyn Fn() + Send + Sync>;

/// Publish/subscribe hub shared by all widget instances on a page.
#[derive(Default)]
pub struct NotificationHub {
    next_id: AtomicU64,
    subscribers: Mutex<HashMap<HubTopic, Vec<(u64, Subscriber)>>>,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, topic: HubTopic, callback: Subscriber) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        lock(&self.subscribers)
            .entry(topic)
            .or_default()
            .push((id, callback));
        id
    }

    pub fn unsubscribe(&self, topic: HubTopic, id: u64) {
        if let Some(entries) = lock(&self.subscribers).get_mut(&topic) {
            entries.retain(|(entry_id, _)| *entry_id != id);
        }
    }

    /// Notify every subscriber of `topic`, including the publisher's own
    /// subscription.
    pub fn publish(&self, topic: HubTopic) {
        self.notify(topic, None);
    }

    /// Notify every subscriber of `topic` except the subscription
    /// registered under `skip`.
    pub fn publish_except(&self, topic: HubTopic, skip: u64) {
        self.notify(topic, Some(skip));
    }

    fn notify(&self, topic: HubTopic, skip: Option<u64>) {
        let subscribers: Vec<Subscriber> = lock(&self.subscribers)
            .get(&topic)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|(id, _)| Some(*id) != skip)
                    .map(|(_, cb)| Arc::clone(cb))
                    .collect()
            })
            .unwrap_or_default();
        for subscriber in subscribers {
            subscriber();
        }
    }

    pub fn subscriber_count(&self, topic: HubTopic) -> usize {
        lock(&self.subscribers)
            .get(&topic)
            .map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    #[test]
    fn publish_reaches_every_subscriber() {
        let hub = NotificationHub::new();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        for counter in [&first, &second] {
            let counter = Arc::clone(counter);
            hub.subscribe(
                HubTopic::UserIdentityChanged,
                Arc::new(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                }),
            );
        }

        hub.publish(HubTopic::UserIdentityChanged);
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unsubscribe_removes_only_the_named_subscription() {
        let hub = NotificationHub::new();
        let kept = Arc::new(AtomicUsize::new(0));
        let dropped = Arc::new(AtomicUsize::new(0));

        {
            let kept = Arc::clone(&kept);
            hub.subscribe(
                HubTopic::UserIdentityChanged,
                Arc::new(move || {
                    kept.fetch_add(1, Ordering::SeqCst);
                }),
            );
        }
        let id = {
            let dropped = Arc::clone(&dropped);
            hub.subscribe(
                HubTopic::UserIdentityChanged,
                Arc::new(move || {
                    dropped.fetch_add(1, Ordering::SeqCst);
                }),
            )
        };

        hub.unsubscribe(HubTopic::UserIdentityChanged, id);
        assert_eq!(hub.subscriber_count(HubTopic::UserIdentityChanged), 1);

        hub.publish(HubTopic::UserIdentityChanged);
        assert_eq!(kept.load(Ordering::SeqCst), 1);
        assert_eq!(dropped.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn publish_except_skips_only_the_named_subscription() {
        let hub = NotificationHub::new();
        let own = Arc::new(AtomicUsize::new(0));
        let sibling = Arc::new(AtomicUsize::new(0));

        let own_id = {
            let own = Arc::clone(&own);
            hub.subscribe(
                HubTopic::UserIdentityChanged,
                Arc::new(move || {
                    own.fetch_add(1, Ordering::SeqCst);
                }),
            )
        };
        {
            let sibling = Arc::clone(&sibling);
            hub.subscribe(
                HubTopic::UserIdentityChanged,
                Arc::new(move || {
                    sibling.fetch_add(1, Ordering::SeqCst);
                }),
            );
        }

        hub.publish_except(HubTopic::UserIdentityChanged, own_id);
        assert_eq!(own.load(Ordering::SeqCst), 0);
        assert_eq!(sibling.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn publish_without_subscribers_is_a_no_op() {
        let hub = NotificationHub::new();
        hub.publish(HubTopic::UserIdentityChanged);
        assert_eq!(hub.subscriber_count(HubTopic::UserIdentityChanged), 0);
    }
}

//! Observable, newest-first feed of messages.
//!
//! The feed has no interior locking: it is owned by a single consumer
//! context and every mutation notifies subscribers synchronously, so a
//! subscriber never observes a half-applied change.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use crate::item::FeedItem;

pub type FeedCallback = Box<dyn Fn(&FeedEvent) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// What changed in the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedChange {
    /// A message was inserted at index 0.
    Inserted { id: i64 },
    Cleared { removed: usize },
    AgesRefreshed,
}

/// Notification delivered to subscribers after each mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEvent {
    pub change: FeedChange,
    pub count: usize,
}

impl FeedEvent {
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

#[derive(Default)]
pub struct Feed {
    items: VecDeque<FeedItem>,
    subscribers: Vec<(SubscriptionId, FeedCallback)>,
    next_subscription: u64,
}

impl Feed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback invoked after every mutation.
    pub fn subscribe(&mut self, callback: FeedCallback) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, callback));
        id
    }

    /// Returns whether the subscription existed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    /// Insert the newest message at the head.
    pub fn insert_at_head(&mut self, item: FeedItem) {
        let id = item.id();
        self.items.push_front(item);
        self.notify(FeedChange::Inserted { id });
    }

    /// Drop every entry. Always notifies once, even when already empty.
    pub fn clear(&mut self) {
        let removed = self.items.len();
        self.items.clear();
        tracing::debug!(removed, "Feed cleared");
        self.notify(FeedChange::Cleared { removed });
    }

    /// Recompute relative ages. Returns how many entries changed text.
    pub fn refresh_ages(&mut self, now: DateTime<Utc>) -> usize {
        let changed = self
            .items
            .iter_mut()
            .map(|item| item.refresh_age(now))
            .filter(|changed| *changed)
            .count();
        if changed > 0 {
            self.notify(FeedChange::AgesRefreshed);
        }
        changed
    }

    pub fn count(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate newest first.
    pub fn iter(&self) -> impl Iterator<Item = &FeedItem> {
        self.items.iter()
    }

    pub fn get(&self, index: usize) -> Option<&FeedItem> {
        self.items.get(index)
    }

    /// Header text: "No notifications", "1 notification", "N notifications".
    pub fn summary(&self) -> String {
        summary_text(self.count())
    }

    fn notify(&self, change: FeedChange) {
        let event = FeedEvent {
            change,
            count: self.items.len(),
        };
        for (_, callback) in &self.subscribers {
            callback(&event);
        }
    }
}

pub fn summary_text(count: usize) -> String {
    match count {
        0 => "No notifications".to_string(),
        1 => "1 notification".to_string(),
        n => format!("{n} notifications"),
    }
}

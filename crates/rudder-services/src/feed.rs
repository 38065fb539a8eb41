//! Per-user feed subscription records.

use std::sync::RwLock;

use rudder_events::UserId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One feed subscription.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeedSubscription {
    /// Stable identifier.
    pub id: Uuid,
    /// Display label.
    pub label: String,
    /// Feed URL to poll.
    pub url: String,
    /// Poll interval in minutes.
    pub interval_minutes: u32,
    /// Destination directory for matched items, when overridden.
    pub destination: Option<String>,
}

/// Fields accepted when creating a subscription.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFeedSubscription {
    /// Display label.
    pub label: String,
    /// Feed URL to poll.
    pub url: String,
    /// Poll interval in minutes.
    pub interval_minutes: u32,
    /// Destination directory for matched items, when overridden.
    #[serde(default)]
    pub destination: Option<String>,
}

/// In-memory feed subscription list for one user.
pub struct FeedService {
    user: UserId,
    subscriptions: RwLock<Vec<FeedSubscription>>,
}

impl FeedService {
    /// Create an empty subscription list for `user`.
    #[must_use]
    pub fn new(user: UserId) -> Self {
        Self {
            user,
            subscriptions: RwLock::new(Vec::new()),
        }
    }

    /// User identity this list belongs to.
    #[must_use]
    pub const fn user(&self) -> &UserId {
        &self.user
    }

    /// Register a subscription and return the stored record.
    pub fn add(&self, new: NewFeedSubscription) -> FeedSubscription {
        let subscription = FeedSubscription {
            id: Uuid::new_v4(),
            label: new.label,
            url: new.url,
            interval_minutes: new.interval_minutes,
            destination: new.destination,
        };
        self.subscriptions
            .write()
            .expect("feed lock")
            .push(subscription.clone());
        subscription
    }

    /// All subscriptions in registration order.
    #[must_use]
    pub fn list(&self) -> Vec<FeedSubscription> {
        self.subscriptions.read().expect("feed lock").clone()
    }

    /// Remove a subscription; `false` when the id was unknown.
    pub fn remove(&self, id: Uuid) -> bool {
        let mut subscriptions = self.subscriptions.write().expect("feed lock");
        let before = subscriptions.len();
        subscriptions.retain(|subscription| subscription.id != id);
        subscriptions.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_list_and_remove() {
        let service = FeedService::new(UserId::new("alice"));
        let stored = service.add(NewFeedSubscription {
            label: "distro releases".into(),
            url: "https://example.org/releases.xml".into(),
            interval_minutes: 15,
            destination: None,
        });

        assert_eq!(service.list().len(), 1);
        assert!(service.remove(stored.id));
        assert!(!service.remove(stored.id), "second removal is a no-op");
        assert!(service.list().is_empty());
    }
}

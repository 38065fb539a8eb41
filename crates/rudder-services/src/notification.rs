//! Bounded per-user notification log.

use std::collections::VecDeque;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use rudder_events::{Event, EventBus, UserId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Retained notifications per user; older entries fall off the front.
const LOG_CAPACITY: usize = 100;

/// One notification entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notification {
    /// Stable identifier.
    pub id: Uuid,
    /// Creation timestamp.
    pub timestamp: DateTime<Utc>,
    /// Machine-friendly category, e.g. `torrent_finished`.
    pub kind: String,
    /// Human-readable payload.
    pub message: String,
    /// Whether the user has acknowledged the entry.
    pub read: bool,
}

/// Totals reported alongside every listing.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationCounts {
    /// All retained entries.
    pub total: usize,
    /// Entries not yet acknowledged.
    pub unread: usize,
}

/// In-memory notification log for one user.
pub struct NotificationService {
    user: UserId,
    events: EventBus,
    log: RwLock<VecDeque<Notification>>,
}

impl NotificationService {
    /// Create an empty log for `user`.
    #[must_use]
    pub fn new(user: UserId, events: EventBus) -> Self {
        Self {
            user,
            events,
            log: RwLock::new(VecDeque::with_capacity(LOG_CAPACITY)),
        }
    }

    /// Append an entry and announce it on the bus.
    pub fn add(&self, kind: impl Into<String>, message: impl Into<String>) -> Notification {
        let notification = Notification {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            kind: kind.into(),
            message: message.into(),
            read: false,
        };

        {
            let mut log = self.log.write().expect("notification lock");
            if log.len() == LOG_CAPACITY {
                log.pop_front();
            }
            log.push_back(notification.clone());
        }
        let _ = self.events.publish(Event::NotificationAdded {
            user: self.user.clone(),
        });
        notification
    }

    /// Newest-first page of entries plus the current totals.
    #[must_use]
    pub fn list(&self, offset: usize, limit: usize) -> (Vec<Notification>, NotificationCounts) {
        let log = self.log.read().expect("notification lock");
        let entries = log
            .iter()
            .rev()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();
        (entries, counts_of(&log))
    }

    /// Current totals without paging.
    #[must_use]
    pub fn counts(&self) -> NotificationCounts {
        counts_of(&self.log.read().expect("notification lock"))
    }

    /// Acknowledge every retained entry.
    pub fn mark_all_read(&self) {
        let mut log = self.log.write().expect("notification lock");
        for entry in log.iter_mut() {
            entry.read = true;
        }
    }

    /// Drop every retained entry.
    pub fn clear(&self) {
        self.log.write().expect("notification lock").clear();
    }
}

fn counts_of(log: &VecDeque<Notification>) -> NotificationCounts {
    NotificationCounts {
        total: log.len(),
        unread: log.iter().filter(|entry| !entry.read).count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> (NotificationService, EventBus) {
        let events = EventBus::with_capacity(256);
        let service = NotificationService::new(UserId::new("alice"), events.clone());
        (service, events)
    }

    #[test]
    fn add_list_and_acknowledge() {
        let (service, events) = service();
        service.add("torrent_finished", "arch.iso finished");
        service.add("torrent_error", "book.pdf tracker unreachable");

        let (page, counts) = service.list(0, 10);
        assert_eq!(counts.total, 2);
        assert_eq!(counts.unread, 2);
        assert_eq!(page[0].kind, "torrent_error", "newest first");
        assert_eq!(events.last_event_id(), Some(2));

        service.mark_all_read();
        assert_eq!(service.counts().unread, 0);

        service.clear();
        assert_eq!(service.counts().total, 0);
    }

    #[test]
    fn log_is_bounded() {
        let (service, _events) = service();
        for i in 0..(LOG_CAPACITY + 5) {
            service.add("torrent_finished", format!("torrent {i}"));
        }

        let counts = service.counts();
        assert_eq!(counts.total, LOG_CAPACITY);
        let (page, _) = service.list(0, 1);
        assert_eq!(page[0].message, format!("torrent {}", LOG_CAPACITY + 4));
    }

    #[test]
    fn paging_skips_and_limits() {
        let (service, _events) = service();
        for i in 0..5 {
            service.add("torrent_finished", format!("torrent {i}"));
        }
        let (page, _) = service.list(1, 2);
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].message, "torrent 3");
        assert_eq!(page[1].message, "torrent 2");
    }
}

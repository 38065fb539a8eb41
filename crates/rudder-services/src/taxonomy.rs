//! Tag and status index derived from the cached torrent list.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use rudder_core::TorrentSummary;
use rudder_events::{Event, EventBus, UserId};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::torrent::TorrentService;

/// Counts grouped by tag, rebuilt after every list refresh.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaxonomySnapshot {
    /// Torrents carrying each tag.
    pub tags: BTreeMap<String, usize>,
    /// Torrents with no tags at all.
    pub untagged: usize,
    /// All torrents in the list.
    pub total: usize,
}

impl TaxonomySnapshot {
    fn from_torrents(torrents: &[TorrentSummary]) -> Self {
        let mut snapshot = Self {
            total: torrents.len(),
            ..Self::default()
        };
        for torrent in torrents {
            if torrent.tags.is_empty() {
                snapshot.untagged += 1;
            }
            for tag in &torrent.tags {
                *snapshot.tags.entry(tag.clone()).or_default() += 1;
            }
        }
        snapshot
    }
}

/// Maintains one user's tag index and announces rebuilds that changed it.
///
/// Owns a listener task subscribed to the event bus; the registry calls
/// [`TaxonomyService::teardown`] when the user is destroyed.
pub struct TaxonomyService {
    user: UserId,
    index: Arc<RwLock<TaxonomySnapshot>>,
    listener: JoinHandle<()>,
}

impl TaxonomyService {
    /// Spawn the listener and start indexing `user`'s list refreshes.
    #[must_use]
    pub fn new(user: UserId, torrents: Arc<TorrentService>, events: &EventBus) -> Self {
        let index = Arc::new(RwLock::new(TaxonomySnapshot::default()));
        let listener = spawn_listener(user.clone(), torrents, events, Arc::clone(&index));
        Self {
            user,
            index,
            listener,
        }
    }

    /// Current index snapshot.
    #[must_use]
    pub fn snapshot(&self) -> TaxonomySnapshot {
        self.index.read().expect("taxonomy lock").clone()
    }

    /// Stop indexing. Idempotent.
    pub fn teardown(&self) {
        debug!(user = %self.user, "taxonomy listener stopped");
        self.listener.abort();
    }
}

impl Drop for TaxonomyService {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

fn spawn_listener(
    user: UserId,
    torrents: Arc<TorrentService>,
    events: &EventBus,
    index: Arc<RwLock<TaxonomySnapshot>>,
) -> JoinHandle<()> {
    let mut stream = events.subscribe(None);
    let bus = events.clone();
    tokio::spawn(async move {
        while let Some(envelope) = stream.next().await {
            let Event::TorrentListChanged { user: owner, .. } = &envelope.event else {
                continue;
            };
            if owner != &user {
                continue;
            }

            let rebuilt = TaxonomySnapshot::from_torrents(&torrents.torrents());
            let changed = {
                let mut current = index.write().expect("taxonomy lock");
                if *current == rebuilt {
                    false
                } else {
                    *current = rebuilt;
                    true
                }
            };
            if changed {
                let _ = bus.publish(Event::TaxonomyChanged { user: user.clone() });
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rudder_proto::testing::ScriptedTransport;
    use serde_json::json;
    use std::time::Duration;

    async fn wait_for_total(service: &TaxonomyService, total: usize) -> TaxonomySnapshot {
        for _ in 0..100 {
            let snapshot = service.snapshot();
            if snapshot.total == total {
                return snapshot;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("index never reached {total} torrents");
    }

    #[tokio::test]
    async fn rebuilds_counts_after_refresh() -> anyhow::Result<()> {
        let transport = Arc::new(ScriptedTransport::default());
        transport.push_ok(vec![json!([
            ["AAA", "a", "/d", 1, 1, 0, "", 10, 5, 0, 0, "linux,iso"],
            ["BBB", "b", "/d", 1, 1, 0, "", 10, 5, 0, 0, "linux"],
            ["CCC", "c", "/d", 0, 0, 1, "", 10, 10, 0, 0, ""],
        ])]);

        let events = EventBus::with_capacity(64);
        let torrents = Arc::new(TorrentService::new(
            UserId::new("alice"),
            transport,
            events.clone(),
        ));
        let taxonomy = TaxonomyService::new(UserId::new("alice"), Arc::clone(&torrents), &events);

        torrents.fetch_torrent_list().await?;
        let snapshot = wait_for_total(&taxonomy, 3).await;
        assert_eq!(snapshot.tags.get("linux"), Some(&2));
        assert_eq!(snapshot.tags.get("iso"), Some(&1));
        assert_eq!(snapshot.untagged, 1);

        taxonomy.teardown();
        Ok(())
    }

    #[tokio::test]
    async fn unchanged_rebuild_stays_quiet() -> anyhow::Result<()> {
        let transport = Arc::new(ScriptedTransport::default());
        let rows = json!([["AAA", "a", "/d", 1, 1, 0, "", 10, 5, 0, 0, "linux"]]);
        transport.push_ok(vec![rows.clone()]);
        transport.push_ok(vec![rows]);

        let events = EventBus::with_capacity(64);
        let torrents = Arc::new(TorrentService::new(
            UserId::new("alice"),
            transport,
            events.clone(),
        ));
        let taxonomy = TaxonomyService::new(UserId::new("alice"), Arc::clone(&torrents), &events);

        torrents.fetch_torrent_list().await?;
        wait_for_total(&taxonomy, 1).await;
        let after_first = events.last_event_id();

        torrents.fetch_torrent_list().await?;
        tokio::time::sleep(Duration::from_millis(20)).await;

        // One refresh event was published, but no second taxonomy event.
        let published: Vec<_> = {
            let mut stream = events.subscribe(Some(after_first.unwrap_or_default()));
            let mut collected = Vec::new();
            while let Ok(Some(envelope)) =
                tokio::time::timeout(Duration::from_millis(20), stream.next()).await
            {
                collected.push(envelope.event.kind());
                if collected.len() > 4 {
                    break;
                }
            }
            collected
        };
        assert_eq!(published, vec!["torrent_list_changed"]);

        taxonomy.teardown();
        Ok(())
    }
}

//! Transfer-rate history sampled from torrent list refreshes.

use std::collections::VecDeque;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use rudder_events::{Event, EventBus, UserId};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::torrent::TorrentService;

/// Number of retained samples. At one refresh per mutation plus periodic
/// polling this covers roughly the last half hour of activity.
const SNAPSHOT_CAPACITY: usize = 360;

/// Aggregate transfer rates at one point in time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RateSnapshot {
    /// Sample timestamp.
    pub timestamp: DateTime<Utc>,
    /// Summed download rate across the list, bytes per second.
    pub down_rate: u64,
    /// Summed upload rate across the list, bytes per second.
    pub up_rate: u64,
}

/// Records one rate sample per torrent-list refresh for a single user.
///
/// The service owns a listener task subscribed to the event bus; dropping the
/// registry entry calls [`HistoryService::teardown`], which aborts it.
pub struct HistoryService {
    user: UserId,
    snapshots: Arc<RwLock<VecDeque<RateSnapshot>>>,
    listener: JoinHandle<()>,
}

impl HistoryService {
    /// Spawn the listener and start sampling `user`'s refreshes.
    #[must_use]
    pub fn new(user: UserId, torrents: Arc<TorrentService>, events: &EventBus) -> Self {
        let snapshots = Arc::new(RwLock::new(VecDeque::with_capacity(SNAPSHOT_CAPACITY)));
        let listener = spawn_listener(user.clone(), torrents, events, Arc::clone(&snapshots));
        Self {
            user,
            snapshots,
            listener,
        }
    }

    /// Retained samples, oldest first.
    #[must_use]
    pub fn snapshots(&self) -> Vec<RateSnapshot> {
        self.snapshots
            .read()
            .expect("history lock")
            .iter()
            .copied()
            .collect()
    }

    /// Stop sampling. Idempotent.
    pub fn teardown(&self) {
        debug!(user = %self.user, "history listener stopped");
        self.listener.abort();
    }
}

impl Drop for HistoryService {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

fn spawn_listener(
    user: UserId,
    torrents: Arc<TorrentService>,
    events: &EventBus,
    snapshots: Arc<RwLock<VecDeque<RateSnapshot>>>,
) -> JoinHandle<()> {
    let mut stream = events.subscribe(None);
    tokio::spawn(async move {
        while let Some(envelope) = stream.next().await {
            let Event::TorrentListChanged { user: owner, .. } = &envelope.event else {
                continue;
            };
            if owner != &user {
                continue;
            }

            let (down_rate, up_rate) = torrents
                .torrents()
                .iter()
                .fold((0, 0), |(down, up), torrent| {
                    (down + torrent.down_rate, up + torrent.up_rate)
                });
            let mut retained = snapshots.write().expect("history lock");
            if retained.len() == SNAPSHOT_CAPACITY {
                retained.pop_front();
            }
            retained.push_back(RateSnapshot {
                timestamp: Utc::now(),
                down_rate,
                up_rate,
            });
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rudder_proto::testing::ScriptedTransport;
    use serde_json::json;
    use std::time::Duration;

    async fn wait_for_samples(history: &HistoryService, count: usize) -> Vec<RateSnapshot> {
        for _ in 0..100 {
            let samples = history.snapshots();
            if samples.len() >= count {
                return samples;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("listener never sampled {count} refreshes");
    }

    #[tokio::test]
    async fn samples_aggregate_rates_per_refresh() -> anyhow::Result<()> {
        let transport = Arc::new(ScriptedTransport::default());
        transport.push_ok(vec![json!([
            ["AAA", "a", "/d", 1, 1, 0, "", 10, 5, 100, 50, ""],
            ["BBB", "b", "/d", 1, 1, 0, "", 10, 5, 25, 75, ""],
        ])]);

        let events = EventBus::with_capacity(16);
        let torrents = Arc::new(TorrentService::new(
            UserId::new("alice"),
            transport,
            events.clone(),
        ));
        let history = HistoryService::new(UserId::new("alice"), Arc::clone(&torrents), &events);

        torrents.fetch_torrent_list().await?;
        let samples = wait_for_samples(&history, 1).await;
        assert_eq!(samples[0].down_rate, 125);
        assert_eq!(samples[0].up_rate, 125);

        history.teardown();
        Ok(())
    }

    #[tokio::test]
    async fn ignores_other_users_refreshes() -> anyhow::Result<()> {
        let transport = Arc::new(ScriptedTransport::default());
        transport.push_ok(vec![json!([])]);

        let events = EventBus::with_capacity(16);
        let torrents = Arc::new(TorrentService::new(
            UserId::new("alice"),
            transport,
            events.clone(),
        ));
        let history = HistoryService::new(UserId::new("bob"), Arc::clone(&torrents), &events);

        torrents.fetch_torrent_list().await?;
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(history.snapshots().is_empty());

        history.teardown();
        Ok(())
    }
}

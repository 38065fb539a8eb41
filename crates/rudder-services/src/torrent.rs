//! Cached view of one user's torrent list.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use rudder_core::{StatusFlag, TorrentSummary};
use rudder_events::{Event, EventBus, UserId};
use rudder_proto::{Request, Transport};
use serde_json::Value;
use tracing::debug;

use crate::error::{ServiceError, ServiceResult};

/// Caches the daemon's torrent list for one user and announces every refresh
/// on the event bus. All mutating operations elsewhere in the backend finish
/// by calling [`TorrentService::fetch_torrent_list`], so consumers only ever
/// observe post-mutation state.
pub struct TorrentService {
    user: UserId,
    transport: Arc<dyn Transport>,
    events: EventBus,
    cache: RwLock<HashMap<String, TorrentSummary>>,
}

impl TorrentService {
    /// Create an empty cache for `user`.
    #[must_use]
    pub fn new(user: UserId, transport: Arc<dyn Transport>, events: EventBus) -> Self {
        Self {
            user,
            transport,
            events,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// User identity this cache belongs to.
    #[must_use]
    pub const fn user(&self) -> &UserId {
        &self.user
    }

    /// Refresh the cache from the daemon and publish the change.
    ///
    /// # Errors
    ///
    /// Fails when the daemon round trip fails or a returned row does not
    /// match the requested property shape.
    pub async fn fetch_torrent_list(&self) -> ServiceResult<Vec<TorrentSummary>> {
        let mut request = Request::new();
        request.list_torrents();
        let response = request.send(self.transport.as_ref()).await?;

        let rows = response
            .get(0)
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let mut torrents = Vec::with_capacity(rows.len());
        for (position, row) in rows.iter().enumerate() {
            torrents.push(parse_row(row).ok_or(ServiceError::MalformedRow { position })?);
        }

        {
            let mut cache = self.cache.write().expect("torrent cache lock");
            cache.clear();
            for torrent in &torrents {
                cache.insert(torrent.hash.clone(), torrent.clone());
            }
        }
        debug!(user = %self.user, torrents = torrents.len(), "torrent list refreshed");
        let _ = self.events.publish(Event::TorrentListChanged {
            user: self.user.clone(),
            torrents: torrents.len(),
        });
        Ok(torrents)
    }

    /// Snapshot of the cached list, sorted by name for stable output.
    #[must_use]
    pub fn torrents(&self) -> Vec<TorrentSummary> {
        let cache = self.cache.read().expect("torrent cache lock");
        let mut torrents: Vec<TorrentSummary> = cache.values().cloned().collect();
        torrents.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.hash.cmp(&b.hash)));
        torrents
    }

    /// Cached row for one hash, if present.
    #[must_use]
    pub fn torrent(&self, hash: &str) -> Option<TorrentSummary> {
        self.cache
            .read()
            .expect("torrent cache lock")
            .get(hash)
            .cloned()
    }

    /// Cached rows for the given hashes, skipping unknown ones.
    #[must_use]
    pub fn torrents_by_hash(&self, hashes: &[String]) -> Vec<TorrentSummary> {
        let cache = self.cache.read().expect("torrent cache lock");
        hashes
            .iter()
            .filter_map(|hash| cache.get(hash).cloned())
            .collect()
    }
}

/// Parse one multicall row, positionally parallel to the requested
/// torrent-list properties.
fn parse_row(row: &Value) -> Option<TorrentSummary> {
    let fields = row.as_array()?;
    if fields.len() != rudder_proto::request::TORRENT_LIST_PROPS.len() {
        return None;
    }

    let hash = fields[0].as_str()?.to_string();
    let name = fields[1].as_str()?.to_string();
    let directory = fields[2].as_str()?.to_string();
    let is_open = field_u64(&fields[3])? != 0;
    let is_active = field_u64(&fields[4])? != 0;
    let complete = field_u64(&fields[5])? != 0;
    let message = fields[6].as_str().unwrap_or_default();
    let size_bytes = field_u64(&fields[7])?;
    let bytes_done = field_u64(&fields[8])?;
    let down_rate = field_u64(&fields[9])?;
    let up_rate = field_u64(&fields[10])?;
    let tags = fields[11]
        .as_str()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect();

    Some(TorrentSummary {
        hash,
        name,
        directory,
        status: derive_status(is_open, is_active, complete, message),
        tags,
        size_bytes,
        bytes_done,
        down_rate,
        up_rate,
    })
}

/// Numeric daemon fields arrive as integers or decimal strings.
fn field_u64(value: &Value) -> Option<u64> {
    value
        .as_u64()
        .or_else(|| value.as_str().and_then(|text| text.parse().ok()))
}

fn derive_status(is_open: bool, is_active: bool, complete: bool, message: &str) -> Vec<StatusFlag> {
    let mut status = Vec::new();
    if !message.is_empty() {
        status.push(StatusFlag::Error);
    }
    if complete {
        status.push(StatusFlag::Complete);
    }
    if is_open {
        if is_active {
            status.push(StatusFlag::Active);
            status.push(if complete {
                StatusFlag::Seeding
            } else {
                StatusFlag::Downloading
            });
        } else {
            status.push(StatusFlag::Inactive);
        }
    } else {
        status.push(StatusFlag::Stopped);
    }
    status
}

#[cfg(test)]
mod tests {
    use super::*;
    use rudder_proto::testing::ScriptedTransport;
    use serde_json::json;

    fn row(hash: &str, name: &str, open: u64, active: u64, complete: u64, tags: &str) -> Value {
        json!([hash, name, "/downloads", open, active, complete, "", 1000, 500, 10, 20, tags])
    }

    fn service_with(transport: Arc<ScriptedTransport>) -> (TorrentService, EventBus) {
        let events = EventBus::with_capacity(16);
        let service = TorrentService::new(UserId::new("alice"), transport, events.clone());
        (service, events)
    }

    #[tokio::test]
    async fn refresh_replaces_cache_and_publishes() -> anyhow::Result<()> {
        let transport = Arc::new(ScriptedTransport::default());
        transport.push_ok(vec![json!([
            row("AAA", "arch.iso", 1, 1, 0, "linux, iso"),
            row("BBB", "book.pdf", 0, 0, 1, ""),
        ])]);
        let (service, events) = service_with(transport);

        let torrents = service.fetch_torrent_list().await?;
        assert_eq!(torrents.len(), 2);
        assert_eq!(events.last_event_id(), Some(1));

        let arch = service.torrent("AAA").expect("cached");
        assert_eq!(arch.tags, vec!["linux", "iso"]);
        assert!(arch.status.contains(&StatusFlag::Downloading));

        let book = service.torrent("BBB").expect("cached");
        assert!(book.is_stopped());
        assert!(book.status.contains(&StatusFlag::Complete));
        Ok(())
    }

    #[tokio::test]
    async fn refresh_drops_rows_that_disappeared() -> anyhow::Result<()> {
        let transport = Arc::new(ScriptedTransport::default());
        transport.push_ok(vec![json!([row("AAA", "arch.iso", 1, 1, 0, "")])]);
        transport.push_ok(vec![json!([row("BBB", "book.pdf", 1, 0, 0, "")])]);
        let (service, _events) = service_with(transport);

        service.fetch_torrent_list().await?;
        assert!(service.torrent("AAA").is_some());

        service.fetch_torrent_list().await?;
        assert!(service.torrent("AAA").is_none(), "cache fully replaced");
        assert!(service.torrent("BBB").is_some());
        Ok(())
    }

    #[tokio::test]
    async fn malformed_row_is_reported_with_position() {
        let transport = Arc::new(ScriptedTransport::default());
        transport.push_ok(vec![json!([["only", "five", "fields", 1, 2]])]);
        let (service, _events) = service_with(transport);

        let error = service.fetch_torrent_list().await.expect_err("bad row");
        assert!(matches!(error, ServiceError::MalformedRow { position: 0 }));
    }

    #[test]
    fn status_derivation_covers_error_and_idle() {
        let status = derive_status(true, false, false, "tracker unreachable");
        assert!(status.contains(&StatusFlag::Error));

        let status = derive_status(true, false, false, "");
        assert_eq!(status, vec![StatusFlag::Inactive]);

        let status = derive_status(true, true, true, "");
        assert!(status.contains(&StatusFlag::Seeding));
    }
}

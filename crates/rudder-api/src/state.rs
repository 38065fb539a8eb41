//! API application state.

use std::sync::Arc;
use std::time::Instant;

use axum::http::HeaderMap;
use rudder_client::TorrentClient;
use rudder_events::{EventBus, UserId};
use rudder_services::registry::ServiceRegistry;

/// Header naming the acting user; absent means the default identity.
pub const HEADER_USER: &str = "x-rudder-user";

/// Identity used when no user header is supplied.
pub const DEFAULT_USER: &str = "default";

/// Shared state handed to every handler.
pub struct ApiState {
    client: TorrentClient,
    started_at: Instant,
}

impl ApiState {
    /// Wrap the torrent client.
    #[must_use]
    pub fn new(client: TorrentClient) -> Self {
        Self {
            client,
            started_at: Instant::now(),
        }
    }

    /// The torrent client facade.
    #[must_use]
    pub const fn client(&self) -> &TorrentClient {
        &self.client
    }

    /// The per-user service registry.
    #[must_use]
    pub const fn registry(&self) -> &Arc<ServiceRegistry> {
        self.client.registry()
    }

    /// The shared event bus.
    #[must_use]
    pub fn events(&self) -> &EventBus {
        self.registry().events()
    }

    /// Seconds since the state was constructed.
    #[must_use]
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

/// Resolve the acting user from request headers.
#[must_use]
pub fn acting_user(headers: &HeaderMap) -> UserId {
    headers
        .get(HEADER_USER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map_or_else(|| UserId::new(DEFAULT_USER), UserId::new)
}

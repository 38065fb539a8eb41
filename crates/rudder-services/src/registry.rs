//! Explicit per-user service registry.
//!
//! One registry instance is constructed at startup and owns every per-user
//! service. Lookups are lazy: the first access for a user creates the
//! service, later accesses return the same instance. A single mutex guards
//! all per-kind maps, so concurrent first accesses still yield one instance.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use rudder_events::{EventBus, UserId};
use rudder_proto::Transport;
use tracing::{info, warn};

use crate::feed::FeedService;
use crate::history::HistoryService;
use crate::notification::NotificationService;
use crate::preferences::PreferenceStore;
use crate::taxonomy::TaxonomyService;
use crate::torrent::TorrentService;

/// Shared dependencies every service is constructed from.
#[derive(Clone)]
pub struct ServiceDeps {
    /// Daemon capability boundary.
    pub transport: Arc<dyn Transport>,
    /// Application-wide event bus.
    pub events: EventBus,
    /// Root directory for persisted per-user state.
    pub data_dir: PathBuf,
}

#[derive(Default)]
struct RegistryMaps {
    torrent: HashMap<UserId, Arc<TorrentService>>,
    history: HashMap<UserId, Arc<HistoryService>>,
    notifications: HashMap<UserId, Arc<NotificationService>>,
    taxonomy: HashMap<UserId, Arc<TaxonomyService>>,
    feeds: HashMap<UserId, Arc<FeedService>>,
}

impl RegistryMaps {
    fn torrent_entry(&mut self, user: &UserId, deps: &ServiceDeps) -> Arc<TorrentService> {
        Arc::clone(self.torrent.entry(user.clone()).or_insert_with(|| {
            Arc::new(TorrentService::new(
                user.clone(),
                Arc::clone(&deps.transport),
                deps.events.clone(),
            ))
        }))
    }
}

/// Owns every per-user service instance.
pub struct ServiceRegistry {
    deps: ServiceDeps,
    preferences: PreferenceStore,
    inner: Mutex<RegistryMaps>,
}

impl ServiceRegistry {
    /// Construct an empty registry over the shared dependencies.
    #[must_use]
    pub fn new(deps: ServiceDeps) -> Self {
        let preferences = PreferenceStore::new(deps.data_dir.join("preferences"));
        Self {
            deps,
            preferences,
            inner: Mutex::new(RegistryMaps::default()),
        }
    }

    /// The shared event bus.
    #[must_use]
    pub const fn events(&self) -> &EventBus {
        &self.deps.events
    }

    /// The daemon transport services dispatch through.
    #[must_use]
    pub fn transport(&self) -> Arc<dyn Transport> {
        Arc::clone(&self.deps.transport)
    }

    /// The persisted preference store.
    #[must_use]
    pub const fn preferences(&self) -> &PreferenceStore {
        &self.preferences
    }

    /// Torrent list cache for `user`, created on first access.
    #[must_use]
    pub fn torrent(&self, user: &UserId) -> Arc<TorrentService> {
        let mut maps = self.inner.lock().expect("registry lock");
        maps.torrent_entry(user, &self.deps)
    }

    /// Rate history for `user`, created on first access.
    #[must_use]
    pub fn history(&self, user: &UserId) -> Arc<HistoryService> {
        let mut maps = self.inner.lock().expect("registry lock");
        let torrents = maps.torrent_entry(user, &self.deps);
        Arc::clone(maps.history.entry(user.clone()).or_insert_with(|| {
            Arc::new(HistoryService::new(user.clone(), torrents, &self.deps.events))
        }))
    }

    /// Notification log for `user`, created on first access.
    #[must_use]
    pub fn notifications(&self, user: &UserId) -> Arc<NotificationService> {
        let mut maps = self.inner.lock().expect("registry lock");
        Arc::clone(maps.notifications.entry(user.clone()).or_insert_with(|| {
            Arc::new(NotificationService::new(
                user.clone(),
                self.deps.events.clone(),
            ))
        }))
    }

    /// Tag index for `user`, created on first access.
    #[must_use]
    pub fn taxonomy(&self, user: &UserId) -> Arc<TaxonomyService> {
        let mut maps = self.inner.lock().expect("registry lock");
        let torrents = maps.torrent_entry(user, &self.deps);
        Arc::clone(maps.taxonomy.entry(user.clone()).or_insert_with(|| {
            Arc::new(TaxonomyService::new(
                user.clone(),
                torrents,
                &self.deps.events,
            ))
        }))
    }

    /// Feed subscriptions for `user`, created on first access.
    #[must_use]
    pub fn feeds(&self, user: &UserId) -> Arc<FeedService> {
        let mut maps = self.inner.lock().expect("registry lock");
        Arc::clone(
            maps.feeds
                .entry(user.clone())
                .or_insert_with(|| Arc::new(FeedService::new(user.clone()))),
        )
    }

    /// Users with at least one live service.
    #[must_use]
    pub fn users(&self) -> Vec<UserId> {
        let maps = self.inner.lock().expect("registry lock");
        let mut users: Vec<UserId> = maps
            .torrent
            .keys()
            .chain(maps.notifications.keys())
            .chain(maps.feeds.keys())
            .cloned()
            .collect();
        users.sort();
        users.dedup();
        users
    }

    /// Drop every service for `user`, stopping its listener tasks and
    /// deleting the persisted preference file.
    ///
    /// Safe to call for users that were never seen; returns whether any
    /// service existed.
    pub fn destroy_user(&self, user: &UserId) -> bool {
        let (torrent, history, notifications, taxonomy, feeds) = {
            let mut maps = self.inner.lock().expect("registry lock");
            (
                maps.torrent.remove(user),
                maps.history.remove(user),
                maps.notifications.remove(user),
                maps.taxonomy.remove(user),
                maps.feeds.remove(user),
            )
        };

        if let Some(history) = &history {
            history.teardown();
        }
        if let Some(taxonomy) = &taxonomy {
            taxonomy.teardown();
        }
        if let Err(error) = self.preferences.remove(user) {
            warn!(user = %user, %error, "preference file removal failed");
        }

        let existed = torrent.is_some()
            || history.is_some()
            || notifications.is_some()
            || taxonomy.is_some()
            || feeds.is_some();
        if existed {
            info!(user = %user, "user services destroyed");
        }
        existed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rudder_proto::testing::ScriptedTransport;

    fn registry() -> Arc<ServiceRegistry> {
        let dir = tempfile::tempdir().expect("tempdir");
        Arc::new(ServiceRegistry::new(ServiceDeps {
            transport: Arc::new(ScriptedTransport::default()),
            events: EventBus::with_capacity(64),
            data_dir: dir.keep(),
        }))
    }

    #[tokio::test]
    async fn repeated_lookups_return_the_same_instance() {
        let registry = registry();
        let user = UserId::new("alice");

        let first = registry.torrent(&user);
        let second = registry.torrent(&user);
        assert!(Arc::ptr_eq(&first, &second));

        let other = registry.torrent(&UserId::new("bob"));
        assert!(!Arc::ptr_eq(&first, &other));
    }

    #[tokio::test]
    async fn concurrent_first_access_creates_one_instance() {
        let registry = registry();
        let user = UserId::new("alice");

        let mut handles = Vec::new();
        for _ in 0..16 {
            let registry = Arc::clone(&registry);
            let user = user.clone();
            handles.push(tokio::spawn(async move { registry.torrent(&user) }));
        }

        let mut instances = Vec::new();
        for handle in handles {
            instances.push(handle.await.expect("task"));
        }
        let first = &instances[0];
        assert!(instances.iter().all(|instance| Arc::ptr_eq(first, instance)));
    }

    #[tokio::test]
    async fn destroy_drops_services_and_later_access_recreates() {
        let registry = registry();
        let user = UserId::new("alice");

        let torrent = registry.torrent(&user);
        let _history = registry.history(&user);
        let _taxonomy = registry.taxonomy(&user);
        registry
            .preferences()
            .save(
                &user,
                &crate::preferences::UserPreferences {
                    start_torrents_on_load: true,
                },
            )
            .expect("save preference");

        assert!(registry.destroy_user(&user));
        assert!(!registry.destroy_user(&user), "second destroy is a no-op");

        let recreated = registry.torrent(&user);
        assert!(!Arc::ptr_eq(&torrent, &recreated));
        let preferences = registry.preferences().load(&user).expect("load preference");
        assert!(
            !preferences.start_torrents_on_load,
            "destroyed users fall back to default preferences"
        );
    }

    #[tokio::test]
    async fn destroy_of_unknown_user_is_a_noop() {
        let registry = registry();
        assert!(!registry.destroy_user(&UserId::new("ghost")));
    }

    #[tokio::test]
    async fn derived_services_share_the_torrent_cache() {
        let registry = registry();
        let user = UserId::new("alice");

        let _history = registry.history(&user);
        let _taxonomy = registry.taxonomy(&user);
        assert_eq!(registry.users(), vec![user.clone()]);

        // History and taxonomy lazily created the torrent service.
        let torrent = registry.torrent(&user);
        assert!(Arc::strong_count(&torrent) > 1);
    }
}

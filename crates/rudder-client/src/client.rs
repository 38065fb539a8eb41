//! The torrent client: one facade over batches, services, and preferences.

use std::collections::BTreeMap;
use std::sync::Arc;

use rudder_core::{
    FlatFile, FileTree, PeerSummary, Priority, SettingUpdate, TagInput, TorrentDetail,
    TrackerSummary,
};
use rudder_events::{Event, UserId};
use rudder_proto::request::ThrottleDirection;
use rudder_proto::{Request, settings_map};
use rudder_services::preferences::UserPreferences;
use rudder_services::registry::ServiceRegistry;
use serde_json::Value;
use tracing::{info, warn};

use crate::error::{ClientError, ClientResult};
use crate::move_plan::{MovePlan, MoveStage};
use crate::types::{AddFilesOptions, AddUrlsOptions, MoveOptions};

/// High-level torrent operations for any user.
///
/// Every mutating operation ends with an unconditional torrent-list refresh
/// for the acting user, even when the mutation already succeeded, so cached
/// state and bus subscribers always observe the post-mutation list.
#[derive(Clone)]
pub struct TorrentClient {
    registry: Arc<ServiceRegistry>,
}

impl TorrentClient {
    /// Wrap the service registry.
    #[must_use]
    pub const fn new(registry: Arc<ServiceRegistry>) -> Self {
        Self { registry }
    }

    /// The underlying registry.
    #[must_use]
    pub const fn registry(&self) -> &Arc<ServiceRegistry> {
        &self.registry
    }

    async fn refresh(&self, user: &UserId) -> ClientResult<()> {
        self.registry.torrent(user).fetch_torrent_list().await?;
        Ok(())
    }

    /// Dispatch a status mutation, then re-fetch the list whether the batch
    /// succeeded or failed, so the cache never goes silently stale. The batch
    /// error takes precedence when both fail.
    async fn send_and_refresh(&self, user: &UserId, request: Request) -> ClientResult<()> {
        let outcome = request.send(self.registry.transport().as_ref()).await;
        let refreshed = self.refresh(user).await;
        outcome?;
        refreshed
    }

    /// Ask the daemon host to create the destination directory. Failures are
    /// logged and swallowed: the load itself reports the authoritative error.
    async fn ensure_destination(&self, destination: &str) {
        let mut request = Request::new();
        request.create_directory(destination);
        if let Err(error) = request.send(self.registry.transport().as_ref()).await {
            warn!(destination, %error, "destination directory create failed");
        }
    }

    /// Add torrents from uploaded metainfo files, one load batch per file.
    ///
    /// The user's start-on-load preference is updated to match this call, so
    /// the last explicit choice becomes the next default.
    ///
    /// # Errors
    ///
    /// Fails when any load batch or the closing list refresh fails.
    pub async fn add_files(&self, user: &UserId, options: AddFilesOptions) -> ClientResult<usize> {
        let tags = options.tags.into_tags();
        self.ensure_destination(&options.destination).await;

        let transport = self.registry.transport();
        for file in &options.files {
            let mut request = Request::new();
            request.add_file(
                &file.content,
                &options.destination,
                options.is_base_path,
                options.start,
                &tags,
            );
            request.send(transport.as_ref()).await?;
            info!(user = %user, name = file.name.as_deref().unwrap_or("upload"), "torrent file loaded");
        }

        self.registry.preferences().save(
            user,
            &UserPreferences {
                start_torrents_on_load: options.start,
            },
        )?;
        self.refresh(user).await?;
        Ok(options.files.len())
    }

    /// Add torrents from URLs or magnet links in one load batch.
    ///
    /// # Errors
    ///
    /// Fails when the load batch or the closing list refresh fails.
    pub async fn add_urls(&self, user: &UserId, options: AddUrlsOptions) -> ClientResult<usize> {
        let tags = options.tags.into_tags();
        self.ensure_destination(&options.destination).await;

        let mut request = Request::new();
        request.add_urls(
            &options.urls,
            &options.destination,
            options.is_base_path,
            options.start,
            &tags,
        );
        request.send(self.registry.transport().as_ref()).await?;

        self.registry.preferences().save(
            user,
            &UserPreferences {
                start_torrents_on_load: options.start,
            },
        )?;
        self.refresh(user).await?;
        Ok(options.urls.len())
    }

    /// Start the listed torrents.
    ///
    /// # Errors
    ///
    /// Fails when the batch or the closing list refresh fails.
    pub async fn start_torrents(&self, user: &UserId, hashes: &[String]) -> ClientResult<()> {
        let mut request = Request::new();
        request.start_torrents(hashes);
        self.send_and_refresh(user, request).await
    }

    /// Stop and close the listed torrents.
    ///
    /// # Errors
    ///
    /// Fails when the batch or the closing list refresh fails.
    pub async fn stop_torrents(&self, user: &UserId, hashes: &[String]) -> ClientResult<()> {
        let mut request = Request::new();
        request.stop_torrents(hashes);
        self.send_and_refresh(user, request).await
    }

    /// Re-verify on-disk data for the listed torrents.
    ///
    /// # Errors
    ///
    /// Fails when the batch or the closing list refresh fails.
    pub async fn check_hash(&self, user: &UserId, hashes: &[String]) -> ClientResult<()> {
        let mut request = Request::new();
        request.check_hash(hashes);
        self.send_and_refresh(user, request).await
    }

    /// Set the scheduling priority of the listed torrents.
    ///
    /// # Errors
    ///
    /// Fails when the batch or the closing list refresh fails.
    pub async fn set_priority(
        &self,
        user: &UserId,
        hashes: &[String],
        priority: Priority,
    ) -> ClientResult<()> {
        let mut request = Request::new();
        request.set_priority(hashes, priority.level());
        self.send_and_refresh(user, request).await
    }

    /// Set per-file priorities within one torrent.
    ///
    /// # Errors
    ///
    /// Fails when the batch or the closing list refresh fails.
    pub async fn set_file_priority(
        &self,
        user: &UserId,
        hash: &str,
        indices: &[u32],
        priority: Priority,
    ) -> ClientResult<()> {
        let mut request = Request::new();
        request.set_file_priority(hash, indices, priority.level());
        self.send_and_refresh(user, request).await
    }

    /// Replace the tag set of the listed torrents.
    ///
    /// # Errors
    ///
    /// Fails when the batch or the closing list refresh fails.
    pub async fn set_taxonomy(
        &self,
        user: &UserId,
        hashes: &[String],
        tags: TagInput,
    ) -> ClientResult<()> {
        let mut request = Request::new();
        request.set_taxonomy(hashes, &tags.into_tags());
        self.send_and_refresh(user, request).await
    }

    /// Relocate torrents through the staged plan: stop, repoint, optionally
    /// move data, re-verify, then restart only what was running before.
    ///
    /// # Errors
    ///
    /// Fails when a hash is not in the cached list, when any stage batch
    /// fails, or when the closing list refresh fails. A failed stage aborts
    /// the remaining stages.
    pub async fn move_torrents(&self, user: &UserId, options: MoveOptions) -> ClientResult<MovePlan> {
        let torrents = self.registry.torrent(user);
        let mut rows = Vec::with_capacity(options.hashes.len());
        for hash in &options.hashes {
            rows.push(
                torrents
                    .torrent(hash)
                    .ok_or_else(|| ClientError::UnknownTorrent { hash: hash.clone() })?,
            );
        }

        let plan = MovePlan::build(&rows, &options);
        let transport = self.registry.transport();
        for stage in &plan.stages {
            let mut request = Request::new();
            match stage {
                MoveStage::Stop => request.stop_torrents(&plan.hashes),
                MoveStage::SetPath => {
                    request.set_download_path(&plan.hashes, &plan.destination, plan.is_base_path)
                }
                MoveStage::MoveData => {
                    request.move_files(&plan.filenames, &plan.sources, &plan.destination)
                }
                MoveStage::CheckHash => request.check_hash(&plan.hashes),
                MoveStage::Restart => request.start_torrents(&plan.restart),
            };
            request.send(transport.as_ref()).await?;
            info!(user = %user, stage = ?stage, torrents = plan.hashes.len(), "move stage completed");
        }

        self.refresh(user).await?;
        Ok(plan)
    }

    /// Fetch daemon settings by internal identifier, values in internal units.
    ///
    /// `None` fetches every supported setting; unknown identifiers are
    /// skipped.
    ///
    /// # Errors
    ///
    /// Fails when the daemon round trip fails.
    pub async fn get_settings(
        &self,
        ids: Option<&[String]>,
    ) -> ClientResult<BTreeMap<String, Value>> {
        // The raw response is positional, so the getter batch must follow the
        // caller's identifier order exactly.
        let requested: Vec<&str> = match ids {
            Some(ids) => ids
                .iter()
                .map(String::as_str)
                .filter(|id| settings_map::raw_for(id).is_some())
                .collect(),
            None => settings_map::internal_ids(),
        };
        if requested.is_empty() {
            return Ok(BTreeMap::new());
        }

        let methods = settings_map::getter_methods(&requested);
        let mut request = Request::new();
        request.fetch_settings(&methods);
        let response = request.send(self.registry.transport().as_ref()).await?;
        let values = response.as_array().cloned().unwrap_or_default();

        Ok(requested
            .iter()
            .zip(values)
            .map(|(id, raw)| {
                (
                    (*id).to_string(),
                    settings_map::to_internal_value(id, raw),
                )
            })
            .collect())
    }

    /// Apply settings mutations, values given in internal units. Unknown
    /// identifiers are skipped; an effectively empty update set short-circuits
    /// without a daemon round trip.
    ///
    /// # Errors
    ///
    /// Fails when the daemon round trip fails.
    pub async fn set_settings(
        &self,
        user: &UserId,
        updates: &[SettingUpdate],
    ) -> ClientResult<usize> {
        let mut request = Request::new();
        let mut applied = 0;
        for update in updates {
            let Some(raw_method) = settings_map::raw_for(&update.id) else {
                warn!(id = %update.id, "unknown setting identifier skipped");
                continue;
            };
            let value = settings_map::to_raw_value(&update.id, update.value.clone());
            request.set_setting(raw_method, &value);
            applied += 1;
        }
        if applied == 0 {
            return Ok(0);
        }

        request.send(self.registry.transport().as_ref()).await?;
        let _ = self
            .registry
            .events()
            .publish(Event::SettingsChanged { user: user.clone() });
        Ok(applied)
    }

    /// Set a global transfer-rate ceiling, given in KiB/s.
    ///
    /// # Errors
    ///
    /// Fails when the daemon round trip fails.
    pub async fn set_speed_limit(
        &self,
        user: &UserId,
        direction: ThrottleDirection,
        kib_per_second: u64,
    ) -> ClientResult<()> {
        let mut request = Request::new();
        request.set_throttle(direction, kib_per_second * 1024);
        request.send(self.registry.transport().as_ref()).await?;
        let _ = self
            .registry
            .events()
            .publish(Event::SettingsChanged { user: user.clone() });
        Ok(())
    }

    /// Fetch the file tree, peers, and trackers of one torrent.
    ///
    /// # Errors
    ///
    /// Fails when the daemon round trip fails or the detail rows do not
    /// match the requested shape.
    pub async fn torrent_details(&self, hash: &str) -> ClientResult<TorrentDetail> {
        let mut request = Request::new();
        request.torrent_details(hash);
        let response = request.send(self.registry.transport().as_ref()).await?;

        parse_details(hash, &response).ok_or_else(|| ClientError::MalformedDetails {
            hash: hash.to_string(),
        })
    }

    /// Passthrough daemon introspection call.
    ///
    /// # Errors
    ///
    /// Fails when the daemon round trip fails.
    pub async fn list_methods(&self, method: &str, args: &[Value]) -> ClientResult<Value> {
        let mut request = Request::new();
        request.list_methods(method, args);
        Ok(request.send(self.registry.transport().as_ref()).await?)
    }
}

fn parse_details(hash: &str, response: &Value) -> Option<TorrentDetail> {
    let sections = response.as_array()?;
    if sections.len() != 3 {
        return None;
    }

    let mut files = Vec::new();
    for (position, row) in sections[0].as_array()?.iter().enumerate() {
        let fields = row.as_array()?;
        files.push(FlatFile {
            index: u32::try_from(position).ok()?,
            path: fields.first()?.as_str()?.to_string(),
            size_bytes: field_u64(fields.get(1)?)?,
        });
    }

    let mut peers = Vec::new();
    for row in sections[1].as_array()? {
        let fields = row.as_array()?;
        peers.push(PeerSummary {
            address: fields.first()?.as_str()?.to_string(),
            client_version: fields
                .get(1)
                .and_then(Value::as_str)
                .filter(|text| !text.is_empty())
                .map(str::to_string),
            down_rate: field_u64(fields.get(2)?)?,
            up_rate: field_u64(fields.get(3)?)?,
        });
    }

    let mut trackers = Vec::new();
    for row in sections[2].as_array()? {
        let fields = row.as_array()?;
        trackers.push(TrackerSummary {
            url: fields.first()?.as_str()?.to_string(),
            enabled: field_u64(fields.get(1)?)? != 0,
        });
    }

    Some(TorrentDetail {
        hash: hash.to_string(),
        file_tree: FileTree::from_flat(&files),
        peers,
        trackers,
    })
}

fn field_u64(value: &Value) -> Option<u64> {
    value
        .as_u64()
        .or_else(|| value.as_str().and_then(|text| text.parse().ok()))
}

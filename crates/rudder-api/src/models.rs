//! Request and response bodies for the HTTP surface.

use rudder_core::{Priority, SettingUpdate, TagInput};
use rudder_proto::request::ThrottleDirection;
use serde::{Deserialize, Serialize};

/// RFC9457-style problem document.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProblemDetails {
    /// Problem type slug.
    #[serde(rename = "type")]
    pub kind: String,
    /// Short human-readable summary, constant per problem type.
    pub title: String,
    /// HTTP status code.
    pub status: u16,
    /// Occurrence-specific detail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Body naming a batch of torrents.
#[derive(Debug, Deserialize)]
pub struct HashesBody {
    /// Torrent hashes the operation applies to.
    pub hashes: Vec<String>,
}

/// Body for torrent priority updates.
#[derive(Debug, Deserialize)]
pub struct PriorityBody {
    /// Torrent hashes the operation applies to.
    pub hashes: Vec<String>,
    /// Priority to apply.
    pub priority: Priority,
}

/// Body for per-file priority updates.
#[derive(Debug, Deserialize)]
pub struct FilePriorityBody {
    /// Torrent the files belong to.
    pub hash: String,
    /// File indices within the torrent.
    pub indices: Vec<u32>,
    /// Priority to apply.
    pub priority: Priority,
}

/// Body replacing the tag set of a batch of torrents.
#[derive(Debug, Deserialize)]
pub struct TaxonomyBody {
    /// Torrent hashes the operation applies to.
    pub hashes: Vec<String>,
    /// Replacement tags, as a list or comma-separated text.
    #[serde(default)]
    pub tags: TagInput,
}

/// Body applying daemon settings, values in internal units.
#[derive(Debug, Deserialize)]
pub struct SettingsBody {
    /// Mutations to apply; unknown identifiers are skipped.
    pub settings: Vec<SettingUpdate>,
}

/// Query selecting which settings to fetch.
#[derive(Debug, Default, Deserialize)]
pub struct SettingsQuery {
    /// Comma-separated internal identifiers; absent fetches everything.
    #[serde(default)]
    pub ids: Option<String>,
}

/// Body setting a global transfer-rate ceiling.
#[derive(Debug, Deserialize)]
pub struct SpeedLimitBody {
    /// Which global ceiling to set.
    pub direction: ThrottleDirection,
    /// Ceiling in KiB/s.
    pub kib_per_second: u64,
}

/// Query selecting files for download.
#[derive(Debug, Default, Deserialize)]
pub struct DownloadQuery {
    /// Comma-separated file indices; absent selects every file.
    #[serde(default)]
    pub indices: Option<String>,
}

/// Paging query for the notification log.
#[derive(Debug, Deserialize)]
pub struct NotificationQuery {
    /// Entries to skip from the newest end.
    #[serde(default)]
    pub offset: usize,
    /// Maximum entries to return.
    #[serde(default = "default_notification_limit")]
    pub limit: usize,
}

const fn default_notification_limit() -> usize {
    20
}

impl Default for NotificationQuery {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: default_notification_limit(),
        }
    }
}

/// Query resuming an event stream.
#[derive(Debug, Default, Deserialize)]
pub struct EventsQuery {
    /// Replay events newer than this id before going live.
    #[serde(default)]
    pub since: Option<u64>,
}

/// Body for the daemon introspection passthrough.
#[derive(Debug, Deserialize)]
pub struct MethodCallBody {
    /// Raw daemon method name.
    pub method: String,
    /// Positional arguments.
    #[serde(default)]
    pub args: Vec<serde_json::Value>,
}

/// Outcome of a staged relocation.
#[derive(Debug, Serialize, Deserialize)]
pub struct MoveResponse {
    /// Torrents relocated.
    pub moved: usize,
    /// Torrents restarted because they were running before the move.
    pub restarted: usize,
}

/// Generic acknowledgement for mutations without a richer payload.
#[derive(Debug, Serialize, Deserialize)]
pub struct Acknowledged {
    /// Number of items the operation touched.
    pub count: usize,
}

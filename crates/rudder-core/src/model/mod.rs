//! Core torrent domain types mirrored from the external daemon.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

/// High-level status flags derived from the daemon's raw state fields.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StatusFlag {
    /// Torrent is closed at the daemon; not transferring and not announced.
    Stopped,
    /// Torrent is open and scheduled by the daemon.
    Active,
    /// Torrent is open but idle.
    Inactive,
    /// Payload is fully downloaded.
    Complete,
    /// Bytes are currently flowing in.
    Downloading,
    /// Bytes are currently flowing out.
    Seeding,
    /// The daemon reported an error condition for this torrent.
    Error,
}

/// One row of the cached torrent list, keyed by content hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TorrentSummary {
    /// Content hash identifying the torrent (unique key).
    pub hash: String,
    /// Display name reported by the daemon.
    pub name: String,
    /// Storage directory path at the daemon host.
    pub directory: String,
    /// Derived status flags.
    pub status: Vec<StatusFlag>,
    /// User-assigned tags.
    pub tags: Vec<String>,
    /// Total payload size in bytes.
    pub size_bytes: u64,
    /// Bytes downloaded so far.
    pub bytes_done: u64,
    /// Current download rate in bytes per second.
    pub down_rate: u64,
    /// Current upload rate in bytes per second.
    pub up_rate: u64,
}

impl TorrentSummary {
    /// Whether the daemon considered the torrent stopped at the last fetch.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.status.contains(&StatusFlag::Stopped)
    }
}

/// A single file within a torrent payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileNode {
    /// Stable numeric index assigned by the daemon (position in metainfo).
    pub index: u32,
    /// File name without directory components.
    pub filename: String,
    /// Path relative to the torrent's storage directory.
    pub path: String,
    /// File size in bytes.
    pub size_bytes: u64,
}

/// Flat file row as reported by the daemon before tree assembly.
#[derive(Debug, Clone)]
pub struct FlatFile {
    /// Stable numeric index assigned by the daemon.
    pub index: u32,
    /// Path relative to the torrent's storage directory.
    pub path: String,
    /// File size in bytes.
    pub size_bytes: u64,
}

/// Recursive view of a torrent payload: files at this level plus nested
/// directories. Directory iteration order is deterministic (sorted by name).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileTree {
    /// Files directly at this level.
    #[serde(default)]
    pub files: Vec<FileNode>,
    /// Nested directories keyed by name.
    #[serde(default)]
    pub directories: BTreeMap<String, FileTree>,
}

impl FileTree {
    /// Assemble a tree from the daemon's flat file listing by splitting each
    /// path on `/` and descending into per-segment directories.
    #[must_use]
    pub fn from_flat(files: &[FlatFile]) -> Self {
        let mut root = Self::default();
        for file in files {
            let mut segments: Vec<&str> = file.path.split('/').collect();
            let filename = segments.pop().unwrap_or_default().to_string();
            let mut cursor = &mut root;
            for segment in segments {
                cursor = cursor.directories.entry(segment.to_string()).or_default();
            }
            cursor.files.push(FileNode {
                index: file.index,
                filename,
                path: file.path.clone(),
                size_bytes: file.size_bytes,
            });
        }
        root
    }

    /// Collect files whose index appears in `indices`, traversing the tree
    /// depth-first. Indices are compared as strings, matching the selection
    /// syntax used at the HTTP boundary. `None` selects every file.
    #[must_use]
    pub fn select_by_indices(&self, indices: Option<&HashSet<String>>) -> Vec<&FileNode> {
        let mut selected: Vec<&FileNode> = self
            .files
            .iter()
            .filter(|file| {
                indices.is_none_or(|wanted| wanted.contains(file.index.to_string().as_str()))
            })
            .collect();

        for subtree in self.directories.values() {
            selected.extend(subtree.select_by_indices(indices));
        }

        selected
    }

    /// Total number of files in the tree.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.files.len()
            + self
                .directories
                .values()
                .map(Self::file_count)
                .sum::<usize>()
    }
}

/// Peer row surfaced in torrent details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerSummary {
    /// Remote peer address.
    pub address: String,
    /// Client identification string, when known.
    pub client_version: Option<String>,
    /// Current download rate from this peer in bytes per second.
    pub down_rate: u64,
    /// Current upload rate to this peer in bytes per second.
    pub up_rate: u64,
}

/// Tracker row surfaced in torrent details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerSummary {
    /// Announce URL.
    pub url: String,
    /// Whether the daemon currently has the tracker enabled.
    pub enabled: bool,
}

/// Detailed view of a single torrent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TorrentDetail {
    /// Content hash identifying the torrent.
    pub hash: String,
    /// Recursive payload file tree.
    pub file_tree: FileTree,
    /// Connected peers.
    pub peers: Vec<PeerSummary>,
    /// Configured trackers.
    pub trackers: Vec<TrackerSummary>,
}

/// Priority levels accepted by the daemon for torrents and files.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Do not transfer.
    Off,
    /// Default scheduling priority.
    #[default]
    Normal,
    /// Prefer over normal-priority items.
    High,
}

impl Priority {
    /// Numeric level understood by the daemon.
    #[must_use]
    pub const fn level(self) -> u8 {
        match self {
            Self::Off => 0,
            Self::Normal => 1,
            Self::High => 2,
        }
    }
}

/// Tag input accepted at the boundary: either an explicit list or free text.
/// Free text is coerced by splitting on commas rather than rejected.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum TagInput {
    /// Already-structured tag list.
    List(Vec<String>),
    /// Comma-separated free text.
    Text(String),
}

impl TagInput {
    /// Normalize into a tag list, trimming entries and dropping empties.
    #[must_use]
    pub fn into_tags(self) -> Vec<String> {
        let raw = match self {
            Self::List(tags) => tags,
            Self::Text(text) => text.split(',').map(str::to_string).collect(),
        };
        raw.into_iter()
            .map(|tag| tag.trim().to_string())
            .filter(|tag| !tag.is_empty())
            .collect()
    }
}

impl Default for TagInput {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

/// One settings mutation crossing the daemon boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingUpdate {
    /// Stable internal setting identifier.
    pub id: String,
    /// New value; numeric identifiers carry numbers, others strings.
    pub value: serde_json::Value,
}

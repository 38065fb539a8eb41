//! Operation option structs accepted at the API boundary.

use rudder_core::TagInput;
use serde::{Deserialize, Serialize};

/// One uploaded metainfo payload, base64-encoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileUpload {
    /// Original filename, kept for logging only.
    #[serde(default)]
    pub name: Option<String>,
    /// Base64-encoded metainfo bytes, forwarded verbatim to the daemon.
    pub content: String,
}

/// Options for adding torrents from uploaded files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddFilesOptions {
    /// Uploaded payloads, loaded one batch per file.
    pub files: Vec<FileUpload>,
    /// Destination directory at the daemon host.
    pub destination: String,
    /// Treat `destination` as the torrent's base path.
    #[serde(default)]
    pub is_base_path: bool,
    /// Start torrents immediately after loading.
    #[serde(default)]
    pub start: bool,
    /// Tags applied to every added torrent.
    #[serde(default)]
    pub tags: TagInput,
}

/// Options for adding torrents from URLs or magnet links.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddUrlsOptions {
    /// URLs or magnet links, loaded in one batch.
    pub urls: Vec<String>,
    /// Destination directory at the daemon host.
    pub destination: String,
    /// Treat `destination` as the torrent's base path.
    #[serde(default)]
    pub is_base_path: bool,
    /// Start torrents immediately after loading.
    #[serde(default)]
    pub start: bool,
    /// Tags applied to every added torrent.
    #[serde(default)]
    pub tags: TagInput,
}

/// Options for relocating torrents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveOptions {
    /// Torrents to relocate.
    pub hashes: Vec<String>,
    /// New storage directory at the daemon host.
    pub destination: String,
    /// Treat `destination` as the torrent's base path.
    #[serde(default)]
    pub is_base_path: bool,
    /// Also move payload data on disk, not just the pointer.
    #[serde(default)]
    pub move_data: bool,
}

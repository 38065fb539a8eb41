#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Daemon-agnostic torrent domain types shared across the workspace.

pub mod model;

pub use model::{
    FileNode, FileTree, FlatFile, PeerSummary, Priority, SettingUpdate, StatusFlag, TagInput,
    TorrentDetail, TorrentSummary, TrackerSummary,
};
pub use rudder_events::UserId;

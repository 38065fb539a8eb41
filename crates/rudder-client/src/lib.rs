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

//! High-level torrent operations over the daemon transport.
//!
//! The [`client::TorrentClient`] composes the per-user services with the
//! batch request layer: every mutation dispatches one or more batches and
//! finishes by refreshing the owning user's torrent list, so cached state is
//! never observed stale after a mutation.

pub mod client;
pub mod error;
pub mod move_plan;
pub mod types;

pub use client::TorrentClient;
pub use error::{ClientError, ClientResult};
pub use move_plan::{MovePlan, MoveStage};
pub use types::{AddFilesOptions, AddUrlsOptions, FileUpload, MoveOptions};

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

//! Per-user service layer: cached daemon state, derived indices, and the
//! registry that owns one service family per user identity.
//!
//! Services never reach into each other through globals; the
//! [`registry::ServiceRegistry`] is constructed once at startup, lazily
//! creates a service family the first time a user is seen, and tears the
//! family down when the user is destroyed.

pub mod error;
pub mod feed;
pub mod history;
pub mod notification;
pub mod preferences;
pub mod registry;
pub mod taxonomy;
pub mod torrent;

pub use error::{ServiceError, ServiceResult};
pub use preferences::{PreferenceStore, UserPreferences};
pub use registry::{ServiceDeps, ServiceRegistry};
pub use torrent::TorrentService;

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

//! Payload packaging: resolve selected files to a download plan and stream
//! it without buffering whole payloads in memory.
//!
//! A single selected file streams as-is; multiple files stream as one tar
//! archive built entry by entry. The archive is produced by a blocking
//! worker writing into a bounded channel, so backpressure from a slow HTTP
//! client throttles the packaging work.

pub mod error;
pub mod plan;
pub mod stream;

pub use error::{DownloadError, DownloadResult};
pub use plan::{ArchiveEntry, DownloadPlan};
pub use stream::{ByteStream, stream_archive, stream_file};

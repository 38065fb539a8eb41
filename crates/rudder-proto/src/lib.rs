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

//! Batch RPC plumbing for the external torrent daemon.
//!
//! Layout: `transport.rs` (the `call(batch)` capability boundary),
//! `request.rs` (batch accumulation and dispatch), `settings_map.rs`
//! (internal↔raw setting identifiers and unit transforms).

pub mod error;
pub mod request;
pub mod settings_map;
pub mod testing;
pub mod transport;

pub use error::{ProtoError, ProtoResult};
pub use request::Request;
pub use transport::{ChannelTransport, MethodCall, Transport, TransportRequest, unconnected};

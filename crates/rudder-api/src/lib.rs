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

//! HTTP delivery surface for the torrent management backend.
//!
//! Routes live in [`http::router`]; each handler resolves the acting user
//! from the `x-rudder-user` header, pulls that user's services out of the
//! registry, and maps domain errors onto RFC9457-style problem responses.

pub mod http;
pub mod models;
pub mod state;

pub use http::router::build_router;
pub use state::ApiState;

//! HTTP handlers, router, and error mapping.

pub mod downloads;
pub mod errors;
pub mod feeds;
pub mod health;
pub mod history;
pub mod notifications;
pub mod router;
pub mod settings;
pub mod sse;
pub mod torrents;
pub mod users;

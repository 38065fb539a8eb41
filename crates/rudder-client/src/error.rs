//! Error types for high-level torrent operations.

use thiserror::Error;

/// Primary error type for client operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A daemon round trip failed.
    #[error(transparent)]
    Proto(#[from] rudder_proto::ProtoError),
    /// A service-layer operation failed.
    #[error(transparent)]
    Service(#[from] rudder_services::ServiceError),
    /// The referenced hash is not present in the cached torrent list.
    #[error("unknown torrent {hash}")]
    UnknownTorrent {
        /// Hash that failed to resolve.
        hash: String,
    },
    /// The daemon returned detail rows that do not match the requested shape.
    #[error("malformed detail rows for torrent {hash}")]
    MalformedDetails {
        /// Torrent whose details failed to parse.
        hash: String,
    },
}

/// Convenience alias for client results.
pub type ClientResult<T> = Result<T, ClientError>;

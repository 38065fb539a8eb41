//! Error types for the per-user service layer.

use thiserror::Error;

/// Primary error type for service operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A daemon round trip failed.
    #[error(transparent)]
    Proto(#[from] rudder_proto::ProtoError),
    /// Reading or writing persisted per-user state failed.
    #[error("preference store i/o failed for {path}")]
    PreferenceIo {
        /// File the operation touched.
        path: std::path::PathBuf,
        /// Underlying i/o failure.
        #[source]
        source: std::io::Error,
    },
    /// Persisted per-user state could not be decoded.
    #[error("preference store payload malformed at {path}")]
    PreferenceDecode {
        /// File that failed to decode.
        path: std::path::PathBuf,
        /// Underlying decode failure.
        #[source]
        source: serde_json::Error,
    },
    /// The daemon returned a list row that does not match the requested shape.
    #[error("malformed torrent list row at position {position}")]
    MalformedRow {
        /// Zero-based row position within the multicall result.
        position: usize,
    },
}

/// Convenience alias for service results.
pub type ServiceResult<T> = Result<T, ServiceError>;

//! Error types for daemon RPC dispatch.

use thiserror::Error;

/// Primary error type for RPC batch operations.
#[derive(Debug, Error)]
pub enum ProtoError {
    /// A request was sent with no accumulated method calls.
    #[error("refusing to send an empty batch")]
    EmptyBatch,
    /// The daemon rejected the batch or returned an error entry.
    #[error("daemon call failed")]
    Daemon {
        /// Method that triggered the failure, when attributable.
        method: Option<String>,
        /// Daemon-reported failure text, surfaced verbatim.
        message: String,
    },
    /// The transport could not reach the daemon.
    #[error("daemon transport unavailable")]
    Unavailable,
    /// The transport returned a result array whose length does not match the batch.
    #[error("daemon response shape mismatch")]
    ShapeMismatch {
        /// Number of calls in the batch.
        expected: usize,
        /// Number of results returned.
        actual: usize,
    },
}

impl ProtoError {
    /// Build a daemon error without method attribution.
    #[must_use]
    pub fn daemon(message: impl Into<String>) -> Self {
        Self::Daemon {
            method: None,
            message: message.into(),
        }
    }
}

/// Convenience alias for RPC operation results.
pub type ProtoResult<T> = Result<T, ProtoError>;

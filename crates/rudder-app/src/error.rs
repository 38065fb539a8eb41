//! # Design
//!
//! - Centralize application-level errors for bootstrap and serving.
//! - Keep error messages constant while carrying context fields for debugging.
//! - Preserve source errors without re-logging at call sites.

use std::io;
use std::net::SocketAddr;

use thiserror::Error;

/// Result alias for application operations.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// An environment variable held a value that could not be parsed.
    #[error("invalid environment configuration")]
    InvalidEnv {
        /// Name of the offending variable.
        name: &'static str,
        /// Value that failed to parse.
        value: String,
    },
    /// Telemetry initialisation failed.
    #[error("telemetry initialisation failed")]
    Telemetry {
        /// Source telemetry error.
        source: anyhow::Error,
    },
    /// Binding the API listener failed.
    #[error("failed to bind api listener")]
    Bind {
        /// Address attempted.
        addr: SocketAddr,
        /// Underlying IO error.
        source: io::Error,
    },
    /// Serving the API failed.
    #[error("api server terminated unexpectedly")]
    Serve {
        /// Underlying IO error.
        source: io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn messages_are_constant_and_context_is_structured() {
        let invalid = AppError::InvalidEnv {
            name: "RUDDER_HTTP_PORT",
            value: "not-a-port".into(),
        };
        assert_eq!(invalid.to_string(), "invalid environment configuration");

        let bind = AppError::Bind {
            addr: "127.0.0.1:3000".parse().expect("addr"),
            source: io::Error::new(io::ErrorKind::AddrInUse, "busy"),
        };
        assert_eq!(bind.to_string(), "failed to bind api listener");
        assert!(bind.source().is_some());
    }
}

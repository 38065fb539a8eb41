//! Error types for payload packaging.

use std::path::PathBuf;

use thiserror::Error;

/// Primary error type for download planning.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The index selection matched no files.
    #[error("selection matched no files in torrent {hash}")]
    NoFilesSelected {
        /// Torrent the selection was applied to.
        hash: String,
    },
    /// A planned file does not exist on disk.
    #[error("payload file missing at {path}")]
    Missing {
        /// Resolved path that failed the existence check.
        path: PathBuf,
        /// Underlying i/o failure.
        #[source]
        source: std::io::Error,
    },
}

/// Convenience alias for download results.
pub type DownloadResult<T> = Result<T, DownloadError>;

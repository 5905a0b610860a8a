use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The common error type used by this crate
#[derive(Error, Debug)]
pub enum PhiAccessLogError {
    /// The log destination could not be opened for appending
    #[error("Failed to open log file {}: {source}", path.display())]
    Open {
        /// Path of the log destination.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// Shifting rotated log files failed
    #[error("Failed to rotate log file {}: {source}", path.display())]
    Rotate {
        /// Path of the log destination.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// Appending a line failed
    #[error("Failed to write log file {}: {source}", path.display())]
    Write {
        /// Path of the log destination.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
}

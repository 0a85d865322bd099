//! Error types for file-based logging

use std::io;
use std::path::PathBuf;

/// Result type for file logger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during file logging
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid construction parameters
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Every open attempt failed
    #[error("Failed opening file {} for writing: {source}", .path.display())]
    FileOpen {
        /// The file that could not be opened
        path: PathBuf,
        /// The error from the last attempt
        source: io::Error,
    },

    /// A write transferred fewer bytes than requested
    #[error("Failed writing to file {}: {source}", .path.display())]
    FileWrite {
        /// The file being written
        path: PathBuf,
        /// The underlying error
        source: io::Error,
    },

    /// The backup rename chain failed even after retrying
    #[error("Failed renaming {} to {}: {source}", .from.display(), .to.display())]
    Rotation {
        /// Rename source
        from: PathBuf,
        /// Rename target
        to: PathBuf,
        /// The error from the last attempt
        source: io::Error,
    },

    /// Operation invoked in an invalid state
    #[error("Invalid usage: {0}")]
    Usage(&'static str),

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Installing the global tracing subscriber failed
    #[error(transparent)]
    SetGlobalDefault(#[from] tracing_subscriber::util::TryInitError),
}

impl Error {
    /// The OS error code carried by this error, if any.
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            Self::FileOpen { source, .. }
            | Self::FileWrite { source, .. }
            | Self::Rotation { source, .. }
            | Self::Io(source) => source.raw_os_error(),
            Self::Configuration(_) | Self::Usage(_) | Self::SetGlobalDefault(_) => None,
        }
    }
}

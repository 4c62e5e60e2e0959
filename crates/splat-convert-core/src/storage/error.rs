use std::{error::Error, fmt, io, path::Path};

use snafu::{Backtrace, prelude::*};

/// Errors produced by the storage backend implementation.
///
/// Only the local filesystem is supported; its I/O errors are wrapped here
/// so [`StorageError`] variants can carry them as their source.
#[derive(Debug)]
pub enum BackendError {
    /// A local filesystem I/O error.
    Local(io::Error),
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::Local(e) => write!(f, "local I/O error: {e}"),
        }
    }
}

impl Error for BackendError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            BackendError::Local(e) => Some(e),
        }
    }
}

/// Wrap an `io::Error` raised at `path`, choosing the variant from its kind.
pub(crate) fn classify_io(path: &Path, e: io::Error) -> StorageError {
    let path = path.display().to_string();
    let kind = e.kind();
    let source = BackendError::Local(e);
    match kind {
        io::ErrorKind::NotFound => StorageError::NotFound {
            path,
            source,
            backtrace: Backtrace::capture(),
        },
        io::ErrorKind::AlreadyExists => StorageError::AlreadyExists {
            path,
            source,
            backtrace: Backtrace::capture(),
        },
        _ => StorageError::OtherIo {
            path,
            source,
            backtrace: Backtrace::capture(),
        },
    }
}

/// Errors that can occur while reading sources or committing outputs.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum StorageError {
    /// The specified path was not found.
    #[snafu(display("Path not found: {path}"))]
    NotFound {
        /// The path that was not found.
        path: String,
        /// Underlying backend error that caused the failure.
        source: BackendError,
        /// The backtrace at the time the error occurred.
        backtrace: Backtrace,
    },

    /// Exclusive creation found the path already taken.
    #[snafu(display("Path already exists: {path}"))]
    AlreadyExists {
        /// The path that was found to already exist.
        path: String,
        /// Underlying backend error that indicates the existing resource.
        source: BackendError,
        /// The backtrace captured when the error occurred.
        backtrace: Backtrace,
    },

    /// Any other I/O error on the local filesystem.
    #[snafu(display("Local I/O error at {path}: {source}"))]
    OtherIo {
        /// The path where the I/O error occurred.
        path: String,
        /// Underlying backend I/O error with platform-specific details.
        source: BackendError,
        /// The backtrace at the time the error occurred.
        backtrace: Backtrace,
    },

    /// The destination path has no file name component.
    #[snafu(display("Destination has no file name: {path}"))]
    InvalidTarget {
        /// The offending destination.
        path: String,
        /// The backtrace captured when the error occurred.
        backtrace: Backtrace,
    },
}

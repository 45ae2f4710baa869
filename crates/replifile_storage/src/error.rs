//! Error types for handle operations.

use crate::flags::ErrorFlags;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for handle operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during handle operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The resource could not be opened.
    #[error("failed to open {path:?} ({flags:?}): {source}")]
    Open {
        /// The path that failed to open.
        path: PathBuf,
        /// Critical flags derived from the native error.
        flags: ErrorFlags,
        /// The native error.
        #[source]
        source: io::Error,
    },

    /// `open` was called on a handle that was already open.
    ///
    /// The previously open resource has been closed.
    #[error("handle was already open; it has been closed")]
    Reopen,

    /// The handle is closed.
    #[error("handle is closed")]
    Closed,

    /// Fewer bytes than requested were available.
    #[error("short read: requested {requested} bytes, got {actual}")]
    ShortRead {
        /// Number of bytes requested.
        requested: usize,
        /// Number of bytes actually read.
        actual: usize,
    },

    /// Fewer bytes than requested were written.
    #[error("short write: requested {requested} bytes, wrote {actual}")]
    ShortWrite {
        /// Number of bytes requested.
        requested: usize,
        /// Number of bytes actually written.
        actual: usize,
    },

    /// The operation requires a handle with no error flags set.
    #[error("handle is not in a good state: {0:?}")]
    NotGood(ErrorFlags),

    /// Stored data failed validation.
    #[error("storage corrupted: {0}")]
    Corrupted(String),
}

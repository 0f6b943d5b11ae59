//! File actions: rename and relocate.
//!
//! These are the mutating operations a matched rule can trigger. Every
//! failure here is per-event: the dispatcher logs it and moves on, the
//! process never dies over a single file.

pub mod peer;
pub mod relocate;
pub mod rename;
pub mod transfer;

pub use relocate::{Relocator, RetryPolicy};
pub use rename::rename_with_pattern;

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while executing a file action
#[derive(Debug, Error)]
pub enum ActionError {
    /// The source never reappeared within the retry budget
    #[error("file vanished after retries: {0}")]
    Vanished(PathBuf),

    /// The destination directory could not be created
    #[error("failed to create directory {path}: {source}")]
    DirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Source or destination could not be inspected for volume identity
    #[error("filesystem check failed: {0}")]
    FilesystemCheck(#[source] std::io::Error),

    /// The source could not be opened for copying
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Byte transfer to the destination failed
    #[error("copy failed: {0}")]
    Copy(#[source] std::io::Error),

    /// The destination did not exist after a completed copy
    #[error("copy verification failed: {0}")]
    Verification(PathBuf),

    /// The source could not be removed after copying; the destination copy
    /// has been deleted and the source remains canonical
    #[error("failed to remove original {path}: {source}")]
    Cleanup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A filesystem rename failed
    #[error("failed to rename {from} to {to}: {source}")]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The rename source does not exist
    #[error("source not found: {0}")]
    NotFound(PathBuf),

    /// The rename pattern is not a valid regular expression
    #[error("invalid rename pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

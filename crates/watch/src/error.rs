//! Watch registration errors.
//!
//! No error here is fatal: a failed registration leaves the document's
//! binding inactive until the next successful path change, and the monitor
//! keeps working without it.

use std::path::PathBuf;

use thiserror::Error;

/// Failure to register a path with the filesystem watch.
#[derive(Debug, Error)]
pub enum WatchError {
    /// The path does not exist on disk, so there is nothing to watch yet.
    #[error("watched path does not exist: {0}")]
    PathMissing(PathBuf),

    /// The platform watcher backend refused the registration.
    #[error("filesystem watcher error: {0}")]
    Backend(#[from] notify::Error),
}

//! Error types shared across the crate

use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop (or refuse to start) the watch-and-sort loop.
///
/// Per-file move failures are deliberately not represented here: they are
/// recorded in the [`SortReport`](crate::sorter::SortReport) of the pass that
/// hit them and never abort anything.
#[derive(Debug, Error)]
pub enum DesktidyError {
    /// Unreadable or invalid configuration, or an unresolvable watched
    /// directory. Fatal before watching starts.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// None of the destination folders could be created.
    #[error("could not provision any destination folder under {root}")]
    ProvisionError { root: PathBuf },

    /// The OS watch subscription was lost (directory deleted, backend
    /// failure). Fatal for the watcher instance; the caller decides whether
    /// to re-resolve the directory and restart.
    #[error("watch subscription lost: {0}")]
    WatchError(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DesktidyError>;

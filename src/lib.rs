//! Desktidy - keep a directory tidy by sorting loose files into
//! category folders
//!
//! This crate provides the core functionality for the Desktidy daemon:
//! an extension-to-folder mapping, destination folder provisioning, an
//! idempotent sort pass, and a debounced filesystem watcher that ties
//! them together.

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod mapping;
pub mod provision;
pub mod sorter;
pub mod watcher;

// Re-export primary types for convenience
pub use config::UserConfig;
pub use error::{DesktidyError, Result};
pub use mapping::ExtensionMap;
pub use provision::{ensure_folders, ProvisionReport};
pub use sorter::{FileEntry, FileSorter, MovedFile, SkippedFile, SortReport};
pub use watcher::{ChangeWatcher, WatcherState};

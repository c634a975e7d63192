// CLI module for argument parsing

use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Desktidy - sort loose files into category folders, automatically
///
/// Watches a directory and moves each new top-level file into a subfolder
/// chosen by its extension; unmapped extensions land in the `noname` folder.
#[derive(Parser, Debug, Clone)]
#[command(name = "desktidy")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Directory to watch and sort
    ///
    /// Overrides the configured directory for this run. If neither is set,
    /// the platform desktop folder is used and persisted.
    pub directory: Option<PathBuf>,

    /// Run a single sort pass and exit instead of watching
    #[arg(long = "once", action = ArgAction::SetTrue)]
    pub once: bool,

    /// List the loose top-level files and exit without moving anything
    #[arg(long = "list", action = ArgAction::SetTrue)]
    pub list: bool,

    /// Dry run mode - report planned moves without moving any file
    #[arg(short = 'n', long = "dry-run", action = ArgAction::SetTrue)]
    pub dry_run: bool,

    /// Quiet window in milliseconds before a sort pass runs
    ///
    /// Overrides the configured value for this run.
    #[arg(long = "debounce-ms")]
    pub debounce_ms: Option<u64>,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Args::parse()
    }

    /// Validate argument combinations
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.once && self.list {
            return Err("--once and --list are mutually exclusive".to_string());
        }
        if self.list && self.dry_run {
            return Err("--dry-run has no effect with --list".to_string());
        }
        Ok(())
    }
}

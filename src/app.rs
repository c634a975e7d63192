//! Post-parse wiring: configuration, provisioning, sorting, watching

use crate::cli::Args;
use crate::config::UserConfig;
use crate::error::Result;
use crate::provision::ensure_folders;
use crate::sorter::{FileSorter, SortReport};
use crate::watcher::ChangeWatcher;
use std::time::Duration;
use tracing::{info, warn};

/// Loads the persisted configuration and runs the program.
///
/// A corrupt or unreadable config file is fatal, not a fall-back-to-defaults
/// case: a typo must not silently discard the configured directory and send
/// sorting to the derived default instead.
pub async fn run(args: Args) -> Result<()> {
    let mut config = UserConfig::load()?;
    run_with_config(args, &mut config).await
}

/// Runs with an already-loaded configuration. Split from [`run`] so the
/// single-pass and report-only paths can be exercised without touching the
/// real config file.
pub async fn run_with_config(args: Args, config: &mut UserConfig) -> Result<()> {
    let root = config.resolve_watched_directory(args.directory.clone())?;
    let mapping = config.extension_map()?;

    if args.list {
        let sorter = FileSorter::new(root, mapping);
        for file in sorter.scan()? {
            println!("{}", file.name);
        }
        return Ok(());
    }

    // Report-only runs leave the watched directory untouched
    if !args.dry_run {
        let provision = ensure_folders(&root, &mapping)?;
        if !provision.failed.is_empty() {
            warn!(
                failed = provision.failed.len(),
                "some destination folders could not be created"
            );
        }
    }

    let mut sorter = FileSorter::new(root.clone(), mapping);
    sorter.set_dry_run(args.dry_run);

    // Sort whatever is already loose before watching starts
    let report = sorter.sort_once()?;
    print_report(&report, sorter.is_dry_run());

    if args.once {
        return Ok(());
    }

    let debounce = Duration::from_millis(args.debounce_ms.unwrap_or_else(|| config.debounce_ms()));
    let mut watcher = ChangeWatcher::new(sorter, debounce);
    watcher.start()?;
    info!(directory = %root.display(), "watching for changes; press Ctrl+C to stop");

    // Suspend until an interrupt arrives or the watch subscription is lost
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let outcome = tokio::select! {
        _ = &mut ctrl_c => None,
        res = watcher.join() => Some(res),
    };

    match outcome {
        None => {
            info!("interrupt received, stopping");
            watcher.stop().await
        }
        Some(res) => res,
    }
}

fn print_report(report: &SortReport, dry_run: bool) {
    if report.is_empty() {
        return;
    }

    if dry_run {
        println!("[DRY RUN] No files will be moved");
    }

    for moved in &report.moved {
        println!("  {} -> {}", moved.from.display(), moved.to.display());
    }

    for skipped in &report.skipped {
        eprintln!("  skipped {}: {}", skipped.path.display(), skipped.reason);
    }

    println!(
        "Sorted {} file(s), skipped {}",
        report.moved.len(),
        report.skipped.len()
    );
}

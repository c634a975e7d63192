//! Filesystem change watching and debounced sort triggering

use crate::error::{DesktidyError, Result};
use crate::sorter::FileSorter;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Lifecycle of one watcher instance. No intermediate states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatcherState {
    Idle,
    Watching,
    Stopped,
}

enum WatchMessage {
    Event(Event),
    /// The notify backend reported an error; the subscription is gone.
    Lost(String),
}

/// Watches one directory (non-recursively) and triggers debounced sort
/// passes on qualifying create/modify events.
///
/// Multiple rapid events coalesce into a single pass: after the first
/// qualifying event the watcher waits for a quiet window, draining further
/// events, then runs exactly one pass. At most one pass is ever in flight;
/// events arriving during a pass queue up and collapse into at most one
/// follow-up pass. Loss of the OS subscription is fatal for the instance
/// and surfaces through [`ChangeWatcher::join`] / [`ChangeWatcher::stop`].
pub struct ChangeWatcher {
    sorter: Arc<FileSorter>,
    debounce: Duration,
    state: WatcherState,
    shutdown_tx: Option<watch::Sender<bool>>,
    task: Option<JoinHandle<Result<()>>>,
}

impl ChangeWatcher {
    pub fn new(sorter: FileSorter, debounce: Duration) -> Self {
        Self {
            sorter: Arc::new(sorter),
            debounce,
            state: WatcherState::Idle,
            shutdown_tx: None,
            task: None,
        }
    }

    pub fn state(&self) -> WatcherState {
        self.state
    }

    /// Subscribes to the OS watch and spawns the event loop. Idle → Watching.
    pub fn start(&mut self) -> Result<()> {
        if self.state != WatcherState::Idle {
            return Err(DesktidyError::WatchError(format!(
                "cannot start watcher in state {:?}",
                self.state
            )));
        }

        let root = self.sorter.root().to_path_buf();
        let (event_tx, event_rx) = mpsc::channel::<WatchMessage>(1024);

        // The callback runs on notify's own thread, so a blocking send is
        // safe here.
        let mut watcher =
            notify::recommended_watcher(move |res: notify::Result<Event>| {
                let message = match res {
                    Ok(event) => WatchMessage::Event(event),
                    Err(e) => WatchMessage::Lost(e.to_string()),
                };
                let _ = event_tx.blocking_send(message);
            })
            .map_err(|e| DesktidyError::WatchError(e.to_string()))?;

        watcher
            .watch(&root, RecursiveMode::NonRecursive)
            .map_err(|e| DesktidyError::WatchError(e.to_string()))?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        self.shutdown_tx = Some(shutdown_tx);

        let sorter = Arc::clone(&self.sorter);
        let debounce = self.debounce;
        self.task = Some(tokio::spawn(event_loop(
            watcher,
            root,
            sorter,
            debounce,
            event_rx,
            shutdown_rx,
        )));

        self.state = WatcherState::Watching;
        info!("watching for changes");
        Ok(())
    }

    /// Signals the event loop to stop, waits for any in-flight sort pass to
    /// finish, and releases the OS watch handle. Watching → Stopped.
    pub async fn stop(&mut self) -> Result<()> {
        if self.state != WatcherState::Watching {
            return Ok(());
        }

        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(true);
        }

        let result = match self.task.take() {
            Some(task) => task
                .await
                .map_err(|e| DesktidyError::WatchError(format!("watcher task failed: {}", e)))?,
            None => Ok(()),
        };

        self.state = WatcherState::Stopped;
        result
    }

    /// Waits for the event loop to exit on its own; returns its error when
    /// the subscription was lost. Cancel-safe: dropping this future leaves
    /// the watcher running.
    pub async fn join(&mut self) -> Result<()> {
        let result = match self.task.as_mut() {
            Some(task) => match task.await {
                Ok(result) => result,
                Err(e) => Err(DesktidyError::WatchError(format!(
                    "watcher task failed: {}",
                    e
                ))),
            },
            None => Ok(()),
        };

        self.task = None;
        self.state = WatcherState::Stopped;
        result
    }
}

async fn event_loop(
    watcher: RecommendedWatcher,
    root: PathBuf,
    sorter: Arc<FileSorter>,
    debounce: Duration,
    mut events: mpsc::Receiver<WatchMessage>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    // Holding the handle keeps the OS subscription alive for the loop's
    // lifetime; dropping it on return unsubscribes.
    let _watcher = watcher;

    loop {
        let message = tokio::select! {
            _ = shutdown.changed() => {
                debug!("watcher stop requested");
                return Ok(());
            }
            message = events.recv() => message,
        };

        match message {
            None => {
                return Err(DesktidyError::WatchError(
                    "event channel closed unexpectedly".to_string(),
                ))
            }
            Some(WatchMessage::Lost(reason)) => {
                return Err(DesktidyError::WatchError(reason));
            }
            Some(WatchMessage::Event(event)) => {
                if !root.is_dir() {
                    return Err(DesktidyError::WatchError(format!(
                        "watched directory {} no longer exists",
                        root.display()
                    )));
                }

                if !qualifies(&event, &root) {
                    continue;
                }

                debug!(kind = ?event.kind, "qualifying change event");

                if drain_until_quiet(&root, debounce, &mut events, &mut shutdown).await? {
                    return Ok(());
                }

                let pass_sorter = Arc::clone(&sorter);
                let report = tokio::task::spawn_blocking(move || pass_sorter.sort_once())
                    .await
                    .map_err(|e| {
                        DesktidyError::WatchError(format!("sort pass panicked: {}", e))
                    })?;

                match report {
                    Ok(report) if report.is_empty() => debug!("sort pass: nothing to do"),
                    Ok(report) => info!(
                        moved = report.moved.len(),
                        skipped = report.skipped.len(),
                        "sort pass complete"
                    ),
                    Err(e) => {
                        if !root.is_dir() {
                            return Err(DesktidyError::WatchError(format!(
                                "watched directory {} no longer exists",
                                root.display()
                            )));
                        }
                        warn!(error = %e, "sort pass failed");
                    }
                }
            }
        }
    }
}

/// Waits until no further event has arrived for one debounce window.
///
/// Returns `Ok(true)` when a stop was requested while waiting.
async fn drain_until_quiet(
    root: &Path,
    debounce: Duration,
    events: &mut mpsc::Receiver<WatchMessage>,
    shutdown: &mut watch::Receiver<bool>,
) -> Result<bool> {
    loop {
        tokio::select! {
            _ = shutdown.changed() => return Ok(true),
            _ = tokio::time::sleep(debounce) => return Ok(false),
            message = events.recv() => match message {
                None => {
                    return Err(DesktidyError::WatchError(
                        "event channel closed unexpectedly".to_string(),
                    ))
                }
                Some(WatchMessage::Lost(reason)) => {
                    return Err(DesktidyError::WatchError(reason))
                }
                Some(WatchMessage::Event(_)) => {
                    // Any further event resets the quiet window
                    continue;
                }
            },
        }
    }
}

/// A qualifying event is a create or modify whose target currently is an
/// existing, non-hidden regular file at the top level of the root.
///
/// Directory events, dotfiles, and the source paths of our own moves (which
/// no longer exist at the top level) all filter out.
fn qualifies(event: &Event, root: &Path) -> bool {
    if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
        return false;
    }

    event.paths.iter().any(|path| {
        path.parent() == Some(root)
            && path.is_file()
            && path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|name| !name.starts_with('.'))
    })
}

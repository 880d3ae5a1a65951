//! Directory monitor.
//!
//! Wraps OS file-change notifications and exposes a channel of typed
//! [`FsEvent`]s. Implements the "Watcher-First" pattern: the notify
//! watcher feeds a sync channel, a bridge thread forwards into tokio,
//! and an event-loop task applies filtering, create-dedup and the
//! existence poll before anything reaches the consumer.
//!
//! Architecture:
//! ```text
//! notify → sync channel → bridge thread → tokio mpsc → event loop → FsEvent
//! ```
//!
//! Changed/Deleted/Renamed are relayed immediately; only create events
//! go through the dedup + poll state machine (see [`dedup`] and [`poll`]).

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::event::{ModifyKind, RenameMode};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

// Per-path create-event dedup table.
mod dedup;
// File-name glob filtering.
mod filter;
// Bounded poll for file materialization.
mod poll;
// Shared event types.
mod types;


pub use filter::GlobFilter;
pub use types::FsEvent;

use dedup::{CreateAction, CreateDedup};

/// Monitor tuning (from the `[watch]` config section).
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// File-name filter; events for non-matching names never surface.
    pub filter: GlobFilter,
    /// How long to wait for a created file to materialize.
    pub creation_wait: Duration,
    /// Existence-poll check interval.
    pub poll_interval: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            filter: GlobFilter::any(),
            creation_wait: Duration::from_secs(2),
            poll_interval: Duration::from_secs(1),
        }
    }
}

/// Directory monitor owning at most one OS watch handle.
///
/// `start` arms the watch, `restart` re-arms the last directory
/// (releasing the old handle first — never two live at once), `stop`
/// releases it. Dropping the monitor stops it; stopping twice is a no-op.
pub struct DirMonitor {
    config: MonitorConfig,
    events_tx: mpsc::Sender<FsEvent>,
    watcher: Option<RecommendedWatcher>,
    dir: Option<PathBuf>,
}

impl DirMonitor {
    /// Create a monitor and the receiving end of its event channel.
    pub fn new(config: MonitorConfig) -> (Self, mpsc::Receiver<FsEvent>) {
        let (events_tx, events_rx) = mpsc::channel(256);
        (
            Self {
                config,
                events_tx,
                watcher: None,
                dir: None,
            },
            events_rx,
        )
    }

    /// Start monitoring `dir`. Any previous watch is released first.
    pub fn start(&mut self, dir: &Path) -> notify::Result<()> {
        self.stop();

        // Sync channel for notify (its callback is not async), bridged
        // into tokio by a dedicated thread.
        let (notify_tx, notify_rx) = std::sync::mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = notify_tx.send(res);
        })?;
        watcher.watch(dir, RecursiveMode::NonRecursive)?;

        let (bridge_tx, bridge_rx) = mpsc::channel(64);
        std::thread::spawn(move || {
            while let Ok(result) = notify_rx.recv() {
                if bridge_tx.blocking_send(result).is_err() {
                    break; // Receiver dropped
                }
            }
        });

        tokio::spawn(run_loop(bridge_rx, self.events_tx.clone(), self.config.clone()));

        self.watcher = Some(watcher);
        self.dir = Some(dir.to_owned());
        Ok(())
    }

    /// Re-arm the last watched directory.
    pub fn restart(&mut self) -> notify::Result<()> {
        let Some(dir) = self.dir.clone() else {
            return Err(notify::Error::generic("monitor was never started"));
        };
        self.start(&dir)
    }

    /// Release the OS watch handle. Safe to call repeatedly.
    pub fn stop(&mut self) {
        // Dropping the watcher unwatches and closes the notify channel;
        // the bridge thread and event loop drain and exit on their own.
        self.watcher = None;
    }

    /// Whether a watch handle is currently live.
    pub fn is_running(&self) -> bool {
        self.watcher.is_some()
    }
}

impl Drop for DirMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

// ============================================================================
// Event loop
// ============================================================================

async fn run_loop(
    mut rx: mpsc::Receiver<notify::Result<notify::Event>>,
    tx: mpsc::Sender<FsEvent>,
    config: MonitorConfig,
) {
    let mut dedup = CreateDedup::default();
    while let Some(result) = rx.recv().await {
        match result {
            Ok(event) => {
                if handle_event(&event, &mut dedup, &tx, &config).await.is_err() {
                    break; // Consumer dropped
                }
            }
            // Watch failures (buffer overflow etc.) go out as a distinct
            // event; the loop keeps running.
            Err(e) => {
                if tx.send(FsEvent::Error(e.to_string())).await.is_err() {
                    break;
                }
            }
        }
    }
}

/// Translate one notify event, applying the filter and create dedup.
///
/// Returns `Err(())` when the consumer has gone away.
async fn handle_event(
    event: &notify::Event,
    dedup: &mut CreateDedup,
    tx: &mpsc::Sender<FsEvent>,
    config: &MonitorConfig,
) -> Result<(), ()> {
    match event.kind {
        EventKind::Create(_) => {
            for path in &event.paths {
                if !config.filter.matches(path) {
                    continue;
                }
                match dedup.on_create(path) {
                    CreateAction::Suppress => {
                        crate::debug!("watch"; "suppressed first create: {}", path.display());
                    }
                    CreateAction::BeginPoll => {
                        spawn_poll(path.clone(), tx.clone(), config);
                    }
                }
            }
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            if let [from, to] = event.paths.as_slice() {
                // Renames into and out of the watched name set are both
                // observable.
                if config.filter.matches(from) || config.filter.matches(to) {
                    tx.send(FsEvent::Renamed {
                        from: from.clone(),
                        to: to.clone(),
                    })
                    .await
                    .map_err(|_| ())?;
                }
            }
        }
        // Unpaired rename halves (inotify could not match the cookie).
        // The old name is gone, the new name holds current content.
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
            for path in &event.paths {
                dedup.forget(path);
                if config.filter.matches(path) {
                    tx.send(FsEvent::Deleted(path.clone())).await.map_err(|_| ())?;
                }
            }
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
            for path in &event.paths {
                if config.filter.matches(path) {
                    tx.send(FsEvent::Created(path.clone())).await.map_err(|_| ())?;
                }
            }
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::Any | RenameMode::Other)) => {
            // No direction information at all; existence decides which
            // half of the rename this path is.
            for path in &event.paths {
                if !config.filter.matches(path) {
                    continue;
                }
                let translated = if path.exists() {
                    FsEvent::Created(path.clone())
                } else {
                    dedup.forget(path);
                    FsEvent::Deleted(path.clone())
                };
                tx.send(translated).await.map_err(|_| ())?;
            }
        }
        // mtime/atime/chmod noise would trigger endless rebuild loops
        EventKind::Modify(ModifyKind::Metadata(_)) => {}
        EventKind::Modify(_) => {
            for path in &event.paths {
                if config.filter.matches(path) {
                    tx.send(FsEvent::Changed(path.clone())).await.map_err(|_| ())?;
                }
            }
        }
        EventKind::Remove(_) => {
            for path in &event.paths {
                dedup.forget(path);
                if config.filter.matches(path) {
                    tx.send(FsEvent::Deleted(path.clone())).await.map_err(|_| ())?;
                }
            }
        }
        _ => {}
    }
    Ok(())
}

/// Poll for the file to materialize without blocking the event loop.
/// A file that never appears within the budget is dropped silently.
fn spawn_poll(path: PathBuf, tx: mpsc::Sender<FsEvent>, config: &MonitorConfig) {
    let poll_interval = config.poll_interval;
    let creation_wait = config.creation_wait;
    tokio::spawn(async move {
        if poll::await_materialization(&path, poll_interval, creation_wait).await {
            let _ = tx.send(FsEvent::Created(path)).await;
        } else {
            crate::debug!("watch"; "created file never appeared: {}", path.display());
        }
    });
}

//! Create-event deduplication.
//!
//! The OS notification API reliably fires the create notification twice
//! for one logical file creation. Only the second is meaningful: the
//! first records the path and is suppressed, the second consumes the
//! record and hands the path to the existence poll.

use rustc_hash::FxHashSet;
use std::path::{Path, PathBuf};

/// What to do with an incoming create notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum CreateAction {
    /// First notification for this path: swallow it.
    Suppress,
    /// Second notification: start polling for the file to materialize.
    BeginPoll,
}

/// Per-path dedup table. An entry exists between the first and second
/// create notification for a path.
#[derive(Default)]
pub(super) struct CreateDedup {
    seen: FxHashSet<PathBuf>,
}

impl CreateDedup {
    pub(super) fn on_create(&mut self, path: &Path) -> CreateAction {
        if self.seen.remove(path) {
            CreateAction::BeginPoll
        } else {
            self.seen.insert(path.to_owned());
            CreateAction::Suppress
        }
    }

    /// Drop any pending record (the file was deleted in between).
    pub(super) fn forget(&mut self, path: &Path) {
        self.seen.remove(path);
    }

    #[cfg(test)]
    pub(super) fn len(&self) -> usize {
        self.seen.len()
    }
}

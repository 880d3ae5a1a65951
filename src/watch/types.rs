use std::path::PathBuf;

/// A filesystem notification, after dedup and filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FsEvent {
    /// A new file materialized (raised once per logical creation, and
    /// only after the file is actually observable).
    Created(PathBuf),
    Changed(PathBuf),
    Deleted(PathBuf),
    Renamed { from: PathBuf, to: PathBuf },
    /// OS-level watch failure (e.g. event buffer overflow). The monitor
    /// keeps running; the consumer decides whether to restart it.
    Error(String),
}

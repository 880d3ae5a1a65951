//! Bounded existence polling.
//!
//! After the second create notification, the file may not be observable
//! yet (the OS raises the event before the writer finishes). Check once
//! per interval until it appears or the wait budget runs out.

use std::path::Path;
use std::time::Duration;
use tokio::time::Instant;

/// Poll until `path` exists or `timeout` elapses.
///
/// Returns `true` if the file materialized. A `false` is a benign race,
/// not a failure. The tokio clock drives the sleeps, so tests run this
/// under paused time.
pub(super) async fn await_materialization(
    path: &Path,
    poll_interval: Duration,
    timeout: Duration,
) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if path.exists() {
            return true;
        }
        let now = Instant::now();
        if now >= deadline {
            return false;
        }
        tokio::time::sleep(poll_interval.min(deadline - now)).await;
    }
}

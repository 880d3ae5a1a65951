//! Process-wide shutdown state.
//!
//! One global cancellation token, cancelled by Ctrl+C. Long-running
//! operations (the in-flight compile, the watch loop) create child tokens
//! from it so a single signal tears everything down cooperatively.

use anyhow::Result;
use std::sync::LazyLock;
use tokio_util::sync::CancellationToken;

/// Root cancellation token for the whole process.
static SHUTDOWN: LazyLock<CancellationToken> = LazyLock::new(CancellationToken::new);

/// Get a child token tied to process shutdown.
pub fn shutdown_token() -> CancellationToken {
    SHUTDOWN.child_token()
}

/// Install the Ctrl+C handler. Call once, before any blocking operation.
pub fn setup_shutdown_handler() -> Result<()> {
    ctrlc::set_handler(|| {
        SHUTDOWN.cancel();
    })?;
    Ok(())
}

//! External command execution.
//!
//! Provides a builder-based API for running the diagram compiler (or any
//! external tool) with piped standard streams, stdin feeding, and
//! cooperative cancellation.
//!
//! # Examples
//!
//! ```ignore
//! use crate::exec::Cmd;
//!
//! // Pipe diagram source to the compiler, collect image bytes
//! let output = Cmd::new("plantuml")
//!     .args(["-pipe", "-charset", "UTF-8"])
//!     .stdin(source.as_bytes())
//!     .run(&cancel)
//!     .await?;
//! ```
//!
//! The exit status is captured but never interpreted here: the diagram
//! compiler signals failure through stderr content, which the caller
//! inspects. Only transport-level failures (missing executable, spawn
//! failure, broken streams) surface as [`ExecError`].

use std::{
    ffi::{OsStr, OsString},
    process::{ExitStatus, Stdio},
};

use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

/// Transport-level execution failure.
///
/// Deliberately does not include "non-zero exit": callers decide success
/// by inspecting the captured streams.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("executable `{0}` not found")]
    NotFound(String),

    #[error("failed to spawn `{program}`")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error while talking to `{program}`")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("execution cancelled")]
    Cancelled,
}

/// Captured output of one subprocess invocation.
///
/// Both streams are fully drained before this is returned; each stream
/// preserves its own byte order but there is no ordering between them.
#[derive(Debug)]
pub struct ExecOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

// ============================================================================
// Builder API
// ============================================================================

/// Command builder for external process execution.
#[derive(Default)]
pub struct Cmd {
    program: OsString,
    args: Vec<OsString>,
    stdin_data: Option<Vec<u8>>,
}

impl Cmd {
    /// Create a new command builder.
    pub fn new<S: AsRef<OsStr>>(program: S) -> Self {
        Self {
            program: program.as_ref().to_owned(),
            ..Default::default()
        }
    }

    /// Add a single argument. Empty arguments are dropped.
    pub fn arg<S: AsRef<OsStr>>(mut self, arg: S) -> Self {
        let arg = arg.as_ref();
        if !arg.is_empty() {
            self.args.push(arg.to_owned());
        }
        self
    }

    /// Add multiple arguments. Empty arguments are dropped.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        for arg in args {
            let arg = arg.as_ref();
            if !arg.is_empty() {
                self.args.push(arg.to_owned());
            }
        }
        self
    }

    /// Set stdin bytes to pipe to the process. Stdin is closed (EOF)
    /// once the bytes are written.
    pub fn stdin<D: AsRef<[u8]>>(mut self, data: D) -> Self {
        self.stdin_data = Some(data.as_ref().to_vec());
        self
    }

    /// Get the program name for error messages.
    fn program_name(&self) -> String {
        self.program.to_string_lossy().to_string()
    }

    /// Spawn the process and collect both output streams.
    ///
    /// Stdin is written concurrently with draining stdout/stderr so a
    /// full OS pipe buffer on either side cannot deadlock the child.
    /// If `cancel` fires before the process exits, the child is killed
    /// and any partial output is discarded.
    pub async fn run(self, cancel: &CancellationToken) -> Result<ExecOutput, ExecError> {
        let name = self.program_name();

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // The compiler must never pop up a console window.
        #[cfg(windows)]
        cmd.creation_flags(0x0800_0000); // CREATE_NO_WINDOW

        let mut child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ExecError::NotFound(name.clone())
            } else {
                ExecError::Spawn {
                    program: name.clone(),
                    source: e,
                }
            }
        })?;

        let stdin = child.stdin.take();
        let mut stdout = child.stdout.take();
        let mut stderr = child.stderr.take();
        let stdin_data = self.stdin_data.unwrap_or_default();

        let io = async {
            let write = async {
                if let Some(mut stdin) = stdin {
                    match stdin.write_all(&stdin_data).await {
                        Ok(()) => stdin.shutdown().await?,
                        // Child exited without consuming all input; its
                        // output decides what that means, not us.
                        Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
                        Err(e) => return Err(e),
                    }
                    // Dropping the handle closes the pipe (EOF).
                }
                Ok(())
            };
            let read_out = async {
                let mut buf = Vec::new();
                if let Some(out) = stdout.as_mut() {
                    out.read_to_end(&mut buf).await?;
                }
                Ok::<_, std::io::Error>(buf)
            };
            let read_err = async {
                let mut buf = Vec::new();
                if let Some(err) = stderr.as_mut() {
                    err.read_to_end(&mut buf).await?;
                }
                Ok::<_, std::io::Error>(buf)
            };
            tokio::try_join!(write, read_out, read_err)
        };

        let (stdout, stderr) = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                child.kill().await.ok();
                return Err(ExecError::Cancelled);
            }
            res = io => {
                let ((), stdout, stderr) = res.map_err(|e| ExecError::Io {
                    program: name.clone(),
                    source: e,
                })?;
                (stdout, stderr)
            }
        };

        let status = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                child.kill().await.ok();
                return Err(ExecError::Cancelled);
            }
            status = child.wait() => status.map_err(|e| ExecError::Io {
                program: name.clone(),
                source: e,
            })?,
        };

        let output = ExecOutput {
            status,
            stdout,
            stderr,
        };
        crate::debug!("exec"; "`{}` exited with {:?}", name, output.status.code());
        Ok(output)
    }
}

// ============================================================================
// Tests
// ============================================================================

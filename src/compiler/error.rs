//! Compiler error types and the stderr error-block parser.
//!
//! The external tool reports source-level problems through a fixed,
//! three-line stderr protocol:
//!
//! ```text
//! ERROR
//! 5
//! Syntax Error?
//! ```
//!
//! That parsing is inherently fragile string work, so it lives here
//! behind one narrow function and nothing else in the crate knows the
//! line layout.

use std::path::PathBuf;
use thiserror::Error;

use crate::exec::ExecError;

/// One diagram-source error extracted from a failed compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramError {
    /// 1-based line number in the diagram source (0 when the tool
    /// reports a file-level problem).
    pub line: u32,
    pub message: String,
}

impl std::fmt::Display for DiagramError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

/// Parse the first well-formed error block from stderr text.
///
/// Returns `None` when no block matches — callers must treat that as
/// "stderr content we do not understand", which is distinct from
/// "no error" (empty stderr).
///
/// The tool can in principle emit several blocks; only the first is
/// reported, matching its observed output.
pub fn parse_error_block(stderr: &str) -> Option<DiagramError> {
    let mut lines = stderr.lines();

    while let Some(line) = lines.next() {
        if !line.trim_start().starts_with("ERROR") {
            continue;
        }
        let line_no = lines.next()?.trim().parse::<u32>().ok()?;
        let message = lines.next()?.trim().to_string();
        return Some(DiagramError {
            line: line_no,
            message,
        });
    }

    None
}

// ============================================================================
// CompileError
// ============================================================================

/// Fatal compilation failures.
///
/// Diagram-source errors are NOT here — those are normal outcomes,
/// returned as data in `DiagramResult::Failure`.
#[derive(Debug, Error)]
pub enum CompileError {
    /// Executable not found before spawning (version query precondition).
    #[error("diagram compiler `{0}` is not installed or not on PATH")]
    MissingExecutable(String),

    /// Transport failure from the process executor.
    #[error(transparent)]
    Exec(#[from] ExecError),

    /// Stderr was non-empty but did not match the error-block protocol.
    /// An assumption about the external tool no longer holds; surface
    /// this loudly instead of absorbing it as a diagram error.
    #[error("unrecognized compiler output:\n{0}")]
    UnrecognizedOutput(String),

    /// Stdout could not be decoded as the requested image format.
    #[error("failed to decode compiler output as {format}: {reason}")]
    Decode { format: &'static str, reason: String },

    /// No version token matched the extraction pattern.
    #[error("could not extract version from compiler output")]
    VersionUnavailable,

    #[error("failed to read diagram source `{0}`")]
    ReadSource(PathBuf, #[source] std::io::Error),

    #[error("failed to write image to `{0}`")]
    WriteImage(PathBuf, #[source] std::io::Error),
}

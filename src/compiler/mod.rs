//! Diagram compiler driver.
//!
//! Wraps the external text-to-image compiler: builds its argument list
//! declaratively, pipes the diagram source through the process executor,
//! and turns the result into either a decoded image or a typed diagram
//! error. The exit code is never consulted; stderr content decides.

pub mod args;
pub mod decode;
pub mod error;
pub mod request;

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use tokio_util::sync::CancellationToken;

use crate::exec::Cmd;
use args::ArgList;
use decode::{DiagramImage, decode};
use error::{CompileError, DiagramError, parse_error_block};
use request::{CompileRequest, DiagramSource, ImageFormat};

/// Outcome of one compilation attempt: a decoded image XOR the
/// diagram-source errors the tool reported. Never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagramResult {
    Success(DiagramImage),
    /// Currently at most one element; the parser reports the first
    /// well-formed error block only.
    Failure(Vec<DiagramError>),
}

/// External compiler settings (from the `[compiler]` config section).
#[derive(Debug, Clone)]
pub struct CompilerSettings {
    /// Executable name or path.
    pub program: String,
    /// Flag prefix the tool expects (`-` for PlantUML-style tools).
    pub flag_prefix: String,
    /// Regex with one capture group extracting the version token.
    pub version_pattern: String,
    /// Some tools write their version banner to stderr.
    pub version_on_stderr: bool,
}

impl Default for CompilerSettings {
    fn default() -> Self {
        Self {
            program: "plantuml".into(),
            flag_prefix: "-".into(),
            version_pattern: r"version (\S+)".into(),
            version_on_stderr: true,
        }
    }
}

/// Driver for the external diagram compiler.
pub struct DiagramCompiler {
    settings: CompilerSettings,
    version_re: OnceLock<Option<Regex>>,
}

impl DiagramCompiler {
    pub fn new(settings: CompilerSettings) -> Self {
        Self {
            settings,
            version_re: OnceLock::new(),
        }
    }

    /// Compile to an in-memory image.
    ///
    /// The same source and format compiled twice (without the external
    /// tool changing underneath) yield equal results.
    pub async fn compile_to_image(
        &self,
        req: &CompileRequest,
        cancel: &CancellationToken,
    ) -> Result<DiagramResult, CompileError> {
        let source = self.read_source(req).await?;
        let output = self.run_pipe(req, &source, cancel).await?;

        match interpret_stderr(&output.stderr)? {
            Some(err) => Ok(DiagramResult::Failure(vec![err])),
            None => Ok(DiagramResult::Success(decode(req.format(), output.stdout)?)),
        }
    }

    /// Compile to the request's destination file.
    ///
    /// File-backed sources are handed to the tool directly (output
    /// directory via a file flag); in-memory sources go through
    /// pipe mode and the image bytes are written here. Diagram-source
    /// errors come back as data: an empty vec means the file was written.
    pub async fn compile_to_file(
        &self,
        req: &CompileRequest,
        cancel: &CancellationToken,
    ) -> Result<Vec<DiagramError>, CompileError> {
        let out = req.output().ok_or_else(|| {
            CompileError::WriteImage(
                Default::default(),
                std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "request has no output path",
                ),
            )
        })?;

        if let DiagramSource::File(input) = req.source() {
            let out_dir = out.parent().unwrap_or_else(|| Path::new("."));
            let args = self
                .base_args(req)
                .flag_file("o", out_dir)
                .file(input)
                .build();

            let output = Cmd::new(&self.settings.program)
                .args(args)
                .run(cancel)
                .await?;

            return Ok(interpret_stderr(&output.stderr)?.into_iter().collect());
        }

        // In-memory source: pipe and write the payload ourselves.
        match self.compile_to_image(req, cancel).await? {
            DiagramResult::Success(image) => {
                tokio::fs::write(out, &image.bytes)
                    .await
                    .map_err(|e| CompileError::WriteImage(out.to_path_buf(), e))?;
                Ok(Vec::new())
            }
            DiagramResult::Failure(errors) => Ok(errors),
        }
    }

    /// Query the external tool's version banner.
    ///
    /// A missing executable is a fatal precondition, reported before any
    /// process is spawned.
    pub async fn current_version(&self) -> Result<String, CompileError> {
        which::which(&self.settings.program)
            .map_err(|_| CompileError::MissingExecutable(self.settings.program.clone()))?;

        let args = ArgList::new(&self.settings.flag_prefix).flag("version");
        let output = Cmd::new(&self.settings.program)
            .args(args.build())
            .stdin(b"")
            .run(&CancellationToken::new())
            .await?;

        let banner = if self.settings.version_on_stderr {
            String::from_utf8_lossy(&output.stderr)
        } else {
            String::from_utf8_lossy(&output.stdout)
        };

        self.version_regex()
            .and_then(|re| re.captures(&banner))
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or(CompileError::VersionUnavailable)
    }

    /// Flags shared by every render invocation.
    fn base_args(&self, req: &CompileRequest) -> ArgList {
        ArgList::new(&self.settings.flag_prefix)
            .flag_value("charset", req.charset())
            .flag_if(req.format() == ImageFormat::Vector, "tsvg")
    }

    /// Run the tool in pipe mode: source on stdin, image on stdout.
    async fn run_pipe(
        &self,
        req: &CompileRequest,
        source: &str,
        cancel: &CancellationToken,
    ) -> Result<crate::exec::ExecOutput, CompileError> {
        let args = self.base_args(req).flag("pipe").build();
        Ok(Cmd::new(&self.settings.program)
            .args(args)
            .stdin(source.as_bytes())
            .run(cancel)
            .await?)
    }

    async fn read_source(&self, req: &CompileRequest) -> Result<String, CompileError> {
        match req.source() {
            DiagramSource::Text(text) => Ok(text.clone()),
            DiagramSource::File(path) => tokio::fs::read_to_string(path)
                .await
                .map_err(|e| CompileError::ReadSource(path.clone(), e)),
        }
    }

    /// Version pattern, compiled lazily. The pattern is validated at
    /// config load, so a `None` here only happens for hand-built settings.
    fn version_regex(&self) -> Option<&Regex> {
        self.version_re
            .get_or_init(|| Regex::new(&self.settings.version_pattern).ok())
            .as_ref()
    }
}

/// Classify stderr content.
///
/// - empty → `Ok(None)`: compilation succeeded
/// - well-formed error block → `Ok(Some(err))`: diagram error, a normal outcome
/// - anything else → `Err(UnrecognizedOutput)`: the tool failed in a way
///   the pipeline does not understand
fn interpret_stderr(stderr: &[u8]) -> Result<Option<DiagramError>, CompileError> {
    let text = String::from_utf8_lossy(stderr);
    if text.trim().is_empty() {
        return Ok(None);
    }
    match parse_error_block(&text) {
        Some(err) => Ok(Some(err)),
        None => Err(CompileError::UnrecognizedOutput(text.into_owned())),
    }
}

// ============================================================================
// Tests (fake compiler scripts)
// ============================================================================

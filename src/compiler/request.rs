//! Compile request types.

use std::path::{Path, PathBuf};

/// Target image format for one compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// Bitmap output (PNG from the external tool).
    Raster,
    /// Scalable output (SVG from the external tool).
    Vector,
}

/// Where the diagram source comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagramSource {
    /// Source text held in memory, piped to the compiler's stdin.
    Text(String),
    /// Source file read before compilation.
    File(PathBuf),
}

/// One compilation request. Immutable once built.
#[derive(Debug, Clone)]
pub struct CompileRequest {
    source: DiagramSource,
    format: ImageFormat,
    charset: String,
    /// Destination file. `None` means the image is returned in memory.
    output: Option<PathBuf>,
}

impl CompileRequest {
    pub fn new(source: DiagramSource, format: ImageFormat) -> Self {
        Self {
            source,
            format,
            charset: "UTF-8".into(),
            output: None,
        }
    }

    /// Convenience constructor for in-memory source text.
    pub fn from_text(text: impl Into<String>, format: ImageFormat) -> Self {
        Self::new(DiagramSource::Text(text.into()), format)
    }

    /// Convenience constructor for a source file.
    pub fn from_file(path: impl Into<PathBuf>, format: ImageFormat) -> Self {
        Self::new(DiagramSource::File(path.into()), format)
    }

    /// Charset flag forwarded to the external tool.
    pub fn with_charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = charset.into();
        self
    }

    /// Compile to a file instead of returning the image in memory.
    pub fn with_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = Some(path.into());
        self
    }

    pub fn source(&self) -> &DiagramSource {
        &self.source
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn charset(&self) -> &str {
        &self.charset
    }

    pub fn output(&self) -> Option<&Path> {
        self.output.as_deref()
    }
}

//! One-shot compile command.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::compiler::DiagramCompiler;
use crate::compiler::request::{CompileRequest, ImageFormat};
use crate::config::DiacConfig;
use crate::{core, log};

pub async fn run(
    config: &DiacConfig,
    input: &Path,
    svg: bool,
    output: Option<PathBuf>,
) -> Result<()> {
    let format = if svg {
        ImageFormat::Vector
    } else {
        ImageFormat::Raster
    };
    let out = output.unwrap_or_else(|| input.with_extension(if svg { "svg" } else { "png" }));

    let compiler = DiagramCompiler::new(config.compiler.settings());
    let req = CompileRequest::from_file(input, format)
        .with_charset(&config.compiler.charset)
        .with_output(&out);

    let errors = compiler
        .compile_to_file(&req, &core::shutdown_token())
        .await?;

    if errors.is_empty() {
        log!("compile"; "wrote {}", out.display());
        return Ok(());
    }
    for error in &errors {
        log!("error"; "{}: {error}", input.display());
    }
    anyhow::bail!("{} contains diagram errors", input.display())
}

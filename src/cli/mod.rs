//! Command-line interface: argument definitions and command runners.

mod args;
pub mod compile;
pub mod watch;

pub use args::{Cli, Commands};

use anyhow::Result;

use crate::compiler::DiagramCompiler;
use crate::config::DiacConfig;
use crate::log;

/// `version` subcommand: query and print the external tool's version.
pub async fn print_version(config: &DiacConfig) -> Result<()> {
    let compiler = DiagramCompiler::new(config.compiler.settings());
    let version = compiler.current_version().await?;
    log!("compile"; "{} version {}", config.compiler.program, version);
    Ok(())
}

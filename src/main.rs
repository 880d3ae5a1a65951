//! diac - diagram compiler and watch pipeline.

mod cli;
mod compiler;
mod config;
mod core;
mod exec;
mod logger;
mod mirror;
mod pipeline;
mod watch;

use std::path::Path;

use anyhow::Result;
use clap::{ColorChoice, Parser};

use cli::{Cli, Commands};
use config::DiacConfig;

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    let config = DiacConfig::load(&cli.config)?;

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    // The watch pipeline holds Rc state (not Send), so commands run on
    // the main thread via block_on rather than a spawned task.
    rt.block_on(async {
        match cli.command {
            Commands::Compile { input, svg, output } => {
                cli::compile::run(&config, &input, svg, output).await
            }
            Commands::Watch { dir, svg } => {
                let dir = dir.as_deref().unwrap_or(Path::new("."));
                cli::watch::run(&config, dir, svg).await
            }
            Commands::Version => cli::print_version(&config).await,
        }
    })
}

//! Watch command: monitor a directory and keep its diagrams compiled.

use std::path::Path;

use anyhow::Result;

use crate::compiler::DiagramCompiler;
use crate::compiler::request::ImageFormat;
use crate::config::DiacConfig;
use crate::pipeline::Pipeline;
use crate::watch::DirMonitor;
use crate::{core, log};

pub async fn run(config: &DiacConfig, dir: &Path, svg: bool) -> Result<()> {
    let format = if svg {
        ImageFormat::Vector
    } else {
        ImageFormat::Raster
    };

    let (mut monitor, events) = DirMonitor::new(config.watch.monitor_config()?);
    monitor.start(dir)?;
    log!("watch"; "watching {} ({})", dir.display(), config.watch.filter);

    let compiler = DiagramCompiler::new(config.compiler.settings());
    let pipeline = Pipeline::new(compiler, format, &config.compiler.charset);

    // Runs until Ctrl+C; the monitor channel stays open the whole time.
    pipeline.run(events, &core::shutdown_token()).await;

    monitor.stop();
    log!("watch"; "stopped");
    Ok(())
}

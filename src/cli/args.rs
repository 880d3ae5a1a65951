//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Diagram compiler and watch pipeline CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Show debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path (default: diac.toml)
    #[arg(short = 'C', long, default_value = "diac.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Compile one diagram source file to an image
    #[command(visible_alias = "c")]
    Compile {
        /// Diagram source file
        #[arg(value_hint = clap::ValueHint::FilePath)]
        input: PathBuf,

        /// Produce SVG instead of PNG
        #[arg(short, long)]
        svg: bool,

        /// Output file (default: input with the image extension)
        #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
        output: Option<PathBuf>,
    },

    /// Watch a directory and recompile diagrams as they change
    #[command(visible_alias = "w")]
    Watch {
        /// Directory to watch (default: current directory)
        #[arg(value_hint = clap::ValueHint::DirPath)]
        dir: Option<PathBuf>,

        /// Produce SVG instead of PNG
        #[arg(short, long)]
        svg: bool,
    },

    /// Print the external compiler's version
    Version,
}

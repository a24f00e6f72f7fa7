//! Command-line interface definitions.

use clap::{ColorChoice, Parser};
use std::path::PathBuf;

/// Live markdown preview: edit the file, the browser reloads.
#[derive(Parser, Debug, Clone)]
#[command(name = "md-previewer", version, about, long_about = None)]
pub struct Cli {
    /// Markdown file to preview (`~` and relative paths are resolved)
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub file: Option<String>,

    /// Suppress log output (also passed to the preview server)
    #[arg(short, long)]
    pub quiet: bool,

    /// Config file path (default: md-previewer.toml next to the file)
    #[arg(short = 'C', long, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Control colored output (auto, always, never)
    #[arg(long, default_value = "auto")]
    pub color: ColorChoice,
}

/// Preview server process, normally spawned by `md-previewer`.
#[derive(Parser, Debug, Clone)]
#[command(name = "md-previewer-server", version, about, long_about = None)]
pub struct ServerCli {
    /// Suppress log output
    #[arg(short, long)]
    pub quiet: bool,

    /// Config file path
    #[arg(short = 'C', long, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Directory holding index.html and filePath.txt
    /// (default: <tmp>/<handoff.namespace>)
    #[arg(long, value_hint = clap::ValueHint::DirPath)]
    pub handoff_dir: Option<PathBuf>,

    /// Do not open a browser window
    #[arg(long)]
    pub no_open: bool,

    /// Control colored output (auto, always, never)
    #[arg(long, default_value = "auto")]
    pub color: ColorChoice,
}

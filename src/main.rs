//! `md-previewer --file <path>`: build, spawn the server, watch.

use md_previewer::cli::{self, Cli};
use md_previewer::{core, logger, supervisor};

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    // Before any blocking operation
    core::setup_shutdown_handler()?;

    let cli: Cli = cli::parse_or_exit();
    cli::apply_color(cli.color);
    logger::init(cli.quiet);

    supervisor::run(&cli)
}

//! `md-previewer-server`: serves the handoff directory written by
//! `md-previewer`. Normally started by it, not by hand.

use md_previewer::cli::{self, ServerCli};
use md_previewer::{core, logger, serve};

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    core::setup_shutdown_handler()?;

    let cli: ServerCli = cli::parse_or_exit();
    cli::apply_color(cli.color);
    logger::init(cli.quiet);

    serve::run(&cli)
}

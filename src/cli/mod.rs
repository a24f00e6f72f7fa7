//! Command-line interface module.
//!
//! Parse failures are mapped to exit code 1 (help and version exit 0),
//! rather than clap's default of 2.

mod args;

pub use args::{Cli, ServerCli};

use clap::error::ErrorKind;
use clap::{ColorChoice, Parser};

use crate::error::PreviewError;

/// Parse `std::env::args`, printing help/version or the error and exiting
/// on failure.
pub fn parse_or_exit<P: Parser>() -> P {
    match P::try_parse() {
        Ok(parsed) => parsed,
        Err(err) => {
            let code = match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            if code == 0 {
                let _ = err.print();
            } else {
                let err = PreviewError::InvalidArgument(err.to_string().trim().to_string());
                eprintln!("{err}");
            }
            std::process::exit(code);
        }
    }
}

/// Set global color override based on CLI option
pub fn apply_color(choice: ColorChoice) {
    match choice {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
}

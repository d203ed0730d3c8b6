//! rosetta-construct - Rosetta Construction API engine for Cardano.

use clap::Parser;
use colored::Colorize;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> ExitCode {
    let args = rosetta_construct::Args::parse();

    if args.no_color {
        colored::control::set_override(false);
    }

    init_tracing(args.verbose, !args.no_color);

    match rosetta_construct::run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {}", "error".red(), e);
            if let Some(description) = e.description().filter(|d| *d != e.to_string()) {
                eprintln!("  {}", description.dimmed());
            }

            ExitCode::from(e.exit_code() as u8)
        }
    }
}

/// Log to stderr. `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool, ansi: bool) {
    let default_filter = if verbose {
        "rosetta_construct=debug,warn"
    } else {
        "warn"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(ansi)
                .with_writer(std::io::stderr),
        )
        .init();
}

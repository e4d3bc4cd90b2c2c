//! `todo` binary entry point.
//!
//! Diagnostics go to stderr and stay silent unless `RUST_LOG` selects them,
//! so stdout carries only command output and JSON envelopes.

use std::process::ExitCode;

use clap::Parser;
use todo_list::cli::Cli;
use todo_list::output::{emit_error, infer_command_name_from_args};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Longest `RUST_LOG` value accepted as a filter directive.
const MAX_FILTER_LEN: usize = 4096;

fn main() -> ExitCode {
    init_logging();

    let command = infer_command_name_from_args();
    let cli = Cli::parse();
    let json = cli.json;

    match cli.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let _ = emit_error(&command, &err, json);
            ExitCode::from(u8::try_from(err.exit_code()).unwrap_or(1))
        }
    }
}

fn init_logging() {
    let directive = std::env::var("RUST_LOG").ok();
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(log_filter(directive.as_deref()))
        .init();
}

/// A blank, oversized or unparsable directive turns logging off.
fn log_filter(directive: Option<&str>) -> EnvFilter {
    directive
        .map(str::trim)
        .filter(|raw| !raw.is_empty() && raw.len() <= MAX_FILTER_LEN)
        .and_then(|raw| EnvFilter::try_new(raw).ok())
        .unwrap_or_else(|| EnvFilter::new("off"))
}

//! Triage Control - CLI client for the ticket triage core
//!
//! Trains and evaluates the tier classifier, classifies descriptions and
//! assembles escalation tickets.

use anyhow::Result;
use clap::Parser;
use owo_colors::OwoColorize;
use std::time::Instant;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;
use triage_common::TriageError;
use triagectl::cli::Cli;
use triagectl::commands::{self, Context};
use triagectl::logging::{ErrorDetails, LogEntry};

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // Diagnostics on stderr; stdout carries command output
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn error_details(err: &anyhow::Error) -> ErrorDetails {
    let code = err
        .downcast_ref::<TriageError>()
        .map(TriageError::code)
        .unwrap_or(1);
    ErrorDetails {
        code,
        message: format!("{:#}", err),
    }
}

fn execute(cli: Cli) -> Result<()> {
    let ctx = Context::load(cli.config)?;
    commands::run(&ctx, cli.command)
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let started = Instant::now();
    let command = cli.command.name();
    let args: Vec<String> = std::env::args().skip(1).collect();
    debug!("triagectl v{} {}", env!("TRIAGECTL_VERSION"), command);

    let result = execute(cli);

    let entry = LogEntry::new(
        command,
        args,
        started.elapsed(),
        result.as_ref().err().map(error_details),
    );
    if let Err(e) = entry.write() {
        warn!("Failed to write invocation log: {}", e);
    }

    if let Err(err) = result {
        eprintln!();
        eprintln!("[ERROR] {}", format!("{:#}", err).red());
        std::process::exit(1);
    }
}

//! `unifi-assist` -- helper tools around the UniFi Network API client.
//!
//! Subcommands: `example` (a short read-only tour), `capture` (save raw
//! responses as JSON fixtures) and `check-hook-updates` (daily pre-commit
//! update check).

mod cli;
mod commands;
mod error;
mod logging;

use std::process::ExitCode;

use clap::Parser;

use crate::cli::Cli;
use crate::error::{CliError, exit_code};

#[tokio::main]
async fn main() -> ExitCode {
    // A `.env` in the working directory feeds the `UNIFI_*` flag defaults.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let code = match logging::setup_logging(&cli.global.log_settings()) {
        Ok(span) => match run(cli, span).await {
            Ok(()) => exit_code::SUCCESS,
            Err(err) => report(err),
        },
        Err(err) => report(CliError::from(err)),
    };

    logging::shutdown();
    ExitCode::from(code)
}

async fn run(cli: Cli, span: tracing::Span) -> Result<(), CliError> {
    tracing::debug!(command = ?cli.command, "dispatching command");
    commands::dispatch(cli.command, &cli.global, span).await
}

fn report(err: CliError) -> u8 {
    let code = err.exit_code();
    eprintln!("{:?}", miette::Report::new(err));
    code
}

//! Command dispatch.
//!
//! Controller-facing commands share one client built from the global
//! flags; the hook check needs no controller at all.

pub mod capture;
pub mod example;
pub mod hook_check;

use tracing::Span;

use unifi_assist_api::UnifiClient;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

pub async fn dispatch(cmd: Command, global: &GlobalOpts, span: Span) -> Result<(), CliError> {
    match cmd {
        Command::CheckHookUpdates(args) => hook_check::handle(&args),

        Command::Example(args) => {
            let client = build_client(global, span)?;
            example::handle(&args, &client).await
        }

        Command::Capture(args) => {
            let client = build_client(global, span)?;
            capture::handle(&args, &client).await
        }
    }
}

fn build_client(global: &GlobalOpts, span: Span) -> Result<UnifiClient, CliError> {
    let config = global.client_config()?;
    tracing::debug!(parent: &span, host = %config.host(), "building client");
    Ok(UnifiClient::new(config).with_span(span))
}

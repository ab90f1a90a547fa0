//! molty: send USDC payments and run pay-per-task gigs over an x402-gated
//! A2A API.
//!
//! The binary is a thin wrapper over [`run`]; everything else lives in
//! focused modules so the payment flow is testable without a terminal.

pub mod amount;
pub mod cli;
pub mod config;
pub mod error;
pub mod gig;
pub mod network;
pub mod payment;
pub mod recipient;
pub mod send;

use molty_x402::proto::X402_EXTENSION_URI;

use crate::cli::{Cli, Command};
use crate::config::Config;
use crate::error::CliError;

/// Dispatches a parsed command line against the configured resource server.
pub async fn run(config: &Config, cli: Cli) -> Result<(), CliError> {
    let a2a = molty_a2a::A2aClient::new(
        &config.resource_server_url,
        config.identity_token.clone(),
    )?
    .with_extensions([X402_EXTENSION_URI.to_string()]);

    match cli.command {
        Command::Send {
            recipient,
            amount,
            network,
        } => {
            send::run(
                config,
                &a2a,
                &recipient,
                &amount,
                network.network.map(Into::into),
            )
            .await
        }
        Command::Gig { command } => gig::run(config, &a2a, command).await,
    }
}

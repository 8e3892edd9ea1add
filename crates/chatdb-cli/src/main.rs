#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;
mod dispatch;
mod render;
mod shell;
mod telemetry;

use std::process;

use anyhow::{Context, bail};
use chatdb_client::reqwest::ReqwestClient;
use chatdb_form::FormOrchestrator;

use crate::config::Cli;
use crate::dispatch::{endpoint_of, print_result, submit};
use crate::render::Renderer;

// Tracing target constants
pub const TRACING_TARGET_STARTUP: &str = "chatdb_cli::startup";
pub const TRACING_TARGET_SHUTDOWN: &str = "chatdb_cli::shutdown";
pub const TRACING_TARGET_CONFIG: &str = "chatdb_cli::config";
pub const TRACING_TARGET_COMMAND: &str = "chatdb_cli::command";
pub const TRACING_TARGET_SHELL: &str = "chatdb_cli::shell";

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        tracing::debug!(
            target: TRACING_TARGET_SHUTDOWN,
            "application terminated successfully"
        );
        process::exit(0);
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(
            target: TRACING_TARGET_SHUTDOWN,
            error = %error,
            "application terminated with error"
        );
    } else {
        eprintln!("Error: {error:#}");
    }

    process::exit(1);
}

/// Main application entry point.
async fn run() -> anyhow::Result<()> {
    let cli = Cli::init();

    telemetry::init_tracing(cli.verbose)?;
    cli.validate()?;
    cli.log();

    let client =
        ReqwestClient::new(cli.client.clone()).context("failed to create backend client")?;
    let mut form = FormOrchestrator::new(client.into_service());
    let renderer = Renderer::new(cli.format, cli.client.clone());

    let Some(endpoint) = endpoint_of(&cli.command) else {
        tracing::info!(target: TRACING_TARGET_STARTUP, "starting interactive shell");
        form = form.with_drafts(cli.drafts.open().await?);
        return shell::run(&form, &renderer).await;
    };

    let outcome = submit(&form, &cli.command).await?;
    print_result(&form, &renderer, endpoint).await;

    if !outcome.is_rendered() {
        bail!("'{}' did not complete", cli.command.name());
    }
    Ok(())
}

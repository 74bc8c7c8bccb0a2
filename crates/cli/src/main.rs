//! `ghprojects`: GitHub Projects v2 from the command line.
//!
//! This binary is the composition root. It:
//!
//! 1. loads `.ghprojects/config.toml` (or `--config`) and the API token;
//! 2. installs the tracing subscriber and, when configured, the OTLP exporter;
//! 3. builds one [`github::GithubClient`] and injects it, as both backend
//!    ports, into a [`workflows::ProjectsService`];
//! 4. runs the selected subcommand and prints its payload as JSON on stdout.
//!
//! Exit status is 0 on success, 1 when the operation failed, 2 when start-up
//! failed.

mod commands;
mod config;
mod telemetry;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use github::GithubClient;
use tracing::info;
use workflows::ProjectsService;

use crate::commands::Command;
use crate::config::CliConfig;

#[derive(Debug, Parser)]
#[command(name = "ghprojects", version, about = "Resolve and update GitHub Projects v2")]
struct Cli {
    /// Configuration file (default: .ghprojects/config.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::from(2)
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = CliConfig::load(cli.config.as_deref())?;
    let _telemetry = telemetry::init(&config.telemetry)?;

    let token = config::token_from_env()?;
    let client = Arc::new(
        GithubClient::new(&config.api, token).context("failed to construct GitHub client")?,
    );
    let service = ProjectsService::new(client.clone(), client, config.settings.clone());
    info!(rest = %config.api.rest_base_url, "ghprojects starting");

    let outcome = cli.command.run(&service).await;
    println!("{}", serde_json::to_string_pretty(&outcome)?);

    Ok(if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
